#![forbid(unsafe_code)]
//! Inspect block event files: list transactions, or write a synthetic event

use blockevent::config::load_config;
use blockevent::protocol::{BlockBuilder, EnvelopeBuilder, HeaderType, WireCodec};
use blockevent::{BlockView, DecodeError, Event, SourceHandle, TransactionView};
use clap::{Parser, Subcommand};
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Color as TableColor;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = "blockevent.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decodes an event file and lists its transactions
    Inspect {
        /// The bincode-encoded event file
        file: PathBuf,
        /// Name of the source the event is attributed to
        #[arg(long, default_value = "file")]
        source: String,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Writes a synthetic block event
    Sample {
        /// Where to write the event file
        out: PathBuf,
        /// Number of transactions in the block
        #[arg(long, default_value_t = 3)]
        transactions: usize,
        /// Replace the envelope at this index with undecodable bytes
        #[arg(long)]
        corrupt: Option<usize>,
        /// Channel id written into every envelope
        #[arg(long, default_value = "mychannel")]
        channel: String,
    },
}

#[derive(Serialize)]
struct TxRecord {
    index: usize,
    tx_id: Option<String>,
    channel_id: Option<String>,
    header_type: Option<&'static str>,
    validation_code: Option<String>,
    actions: Option<usize>,
    timestamp: Option<String>,
    error: Option<String>,
}

impl TxRecord {
    fn from_result(index: usize, result: Result<TransactionView<'_>, DecodeError>) -> Self {
        match result {
            Ok(tx) => TxRecord {
                index,
                tx_id: Some(tx.tx_id().to_string()),
                channel_id: Some(tx.channel_id().to_string()),
                header_type: Some(tx.header_type().as_str()),
                validation_code: Some(format!("{:?}", tx.validation_code())),
                actions: Some(tx.action_count()),
                timestamp: tx.timestamp().map(|t| t.to_rfc3339()),
                error: None,
            },
            Err(err) => TxRecord {
                index,
                tx_id: None,
                channel_id: None,
                header_type: None,
                validation_code: None,
                actions: None,
                timestamp: None,
                error: Some(err.to_string()),
            },
        }
    }
}

#[derive(Serialize)]
struct BlockRecord {
    source: String,
    number: u64,
    hash: String,
    previous_hash: String,
    data_hash: String,
    channel_id: Option<String>,
    transactions: Vec<TxRecord>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Inspect { file, source, json } => {
            let bytes = std::fs::read(&file)
                .map_err(|e| format!("Failed to read event file {}: {}", file.display(), e))?;
            let event = Event::from_bytes(&bytes, config.decoder.max_block_size)?;
            let view = BlockView::with_decoder(
                SourceHandle::new(source),
                event,
                WireCodec::new(config.decoder.clone()),
            )?;
            let record = block_record(&view);

            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                print_block(&record);
            }
        }
        Commands::Sample {
            out,
            transactions,
            corrupt,
            channel,
        } => {
            let bytes = sample_event(transactions, corrupt, &channel)?;
            std::fs::write(&out, bytes)?;
            println!(
                "{}",
                format!(
                    "Wrote block event with {} transactions to {}",
                    transactions,
                    out.display()
                )
                .green()
            );
        }
    }

    Ok(())
}

fn block_record(view: &BlockView) -> BlockRecord {
    let transactions = view
        .cursor()
        .enumerate()
        .map(|(index, result)| TxRecord::from_result(index, result))
        .collect();

    BlockRecord {
        source: view.source_handle().to_string(),
        number: view.block_number(),
        hash: hex::encode(view.block_hash()),
        previous_hash: hex::encode(view.previous_hash()),
        data_hash: hex::encode(view.data_hash()),
        channel_id: view.channel_id(),
        transactions,
    }
}

fn print_block(record: &BlockRecord) {
    println!("{}", format!("Block #{}", record.number).bright_cyan().bold());
    println!("  Source:        {}", record.source);
    println!("  Channel:       {}", record.channel_id.as_deref().unwrap_or("-"));
    println!("  Hash:          {}", record.hash);
    println!("  Previous hash: {}", record.previous_hash);
    println!("  Data hash:     {}", record.data_hash);
    println!();

    if record.transactions.is_empty() {
        println!("{}", "No transactions in this block".yellow());
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("#").fg(TableColor::Cyan).add_attribute(Attribute::Bold),
            Cell::new("Tx ID").fg(TableColor::Cyan).add_attribute(Attribute::Bold),
            Cell::new("Type").fg(TableColor::Cyan).add_attribute(Attribute::Bold),
            Cell::new("Validation")
                .fg(TableColor::Cyan)
                .add_attribute(Attribute::Bold),
            Cell::new("Actions")
                .fg(TableColor::Cyan)
                .add_attribute(Attribute::Bold),
            Cell::new("Timestamp")
                .fg(TableColor::Cyan)
                .add_attribute(Attribute::Bold),
        ]);

    let mut malformed = 0;
    for tx in &record.transactions {
        match &tx.error {
            Some(error) => {
                malformed += 1;
                table.add_row(vec![
                    Cell::new(tx.index).fg(TableColor::White),
                    Cell::new(error).fg(TableColor::Red),
                    Cell::new("-").fg(TableColor::Grey),
                    Cell::new("MALFORMED").fg(TableColor::Red),
                    Cell::new("-").fg(TableColor::Grey),
                    Cell::new("-").fg(TableColor::Grey),
                ]);
            }
            None => {
                let validation = tx.validation_code.clone().unwrap_or_default();
                let color = if validation == "Valid" {
                    TableColor::Green
                } else {
                    TableColor::Yellow
                };
                table.add_row(vec![
                    Cell::new(tx.index).fg(TableColor::White),
                    Cell::new(short_id(tx.tx_id.as_deref().unwrap_or_default()))
                        .fg(TableColor::White),
                    Cell::new(tx.header_type.unwrap_or_default()).fg(TableColor::Magenta),
                    Cell::new(validation).fg(color),
                    Cell::new(tx.actions.unwrap_or_default()).fg(TableColor::White),
                    Cell::new(tx.timestamp.as_deref().unwrap_or("-")).fg(TableColor::Grey),
                ]);
            }
        }
    }

    println!("{}", table);
    println!(
        "{}",
        format!(
            "{} transactions, {} malformed",
            record.transactions.len(),
            malformed
        )
        .blue()
    );
}

fn short_id(tx_id: &str) -> String {
    if tx_id.chars().count() <= 20 {
        return tx_id.to_string();
    }

    let head: String = tx_id.chars().take(10).collect();
    let tail_start = tx_id
        .char_indices()
        .rev()
        .nth(5)
        .map(|(i, _)| i)
        .unwrap_or(0);
    format!("{}...{}", head, &tx_id[tail_start..])
}

fn sample_event(
    transactions: usize,
    corrupt: Option<usize>,
    channel: &str,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut builder = BlockBuilder::new(1).previous_hash([0u8; 32]);

    for i in 0..transactions {
        if corrupt == Some(i) {
            builder = builder.raw_envelope(b"not an envelope".to_vec());
            continue;
        }

        let header_type = if i == 0 {
            HeaderType::Config
        } else {
            HeaderType::EndorserTransaction
        };
        let envelope = EnvelopeBuilder::new(header_type, channel)
            .creator(b"sample-creator".to_vec())
            .nonce((i as u64).to_le_bytes().to_vec())
            .action(b"header".to_vec(), format!("action-{}", i).into_bytes())
            .build()?;
        builder = builder.envelope(envelope);
    }

    let block = builder.build_bytes()?;
    Ok(Event::new(block).with_creator(b"block-inspect".to_vec()).to_bytes()?)
}
