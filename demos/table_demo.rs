//! Example demonstrating table usage.
//!
//! This example shows how to:
//! - Build a table from sorted key-value pairs
//! - Look up keys, including ones that are missing
//! - Scan a range of keys
//! - Catch an out-of-order write
//!
//! Run with `RUST_LOG=debug` to see block flushes and decodes.

use aitable::fs::{DiskFileSystem, FileSystem};
use aitable::{Error, Options, TableReader, TableWriter};
use anyhow::Context;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    println!("=== Table Example ===\n");

    let dir = std::env::temp_dir().join("aitable_example");
    let fs = DiskFileSystem::new(&dir)?;

    // === Part 1: Building a table ===
    println!("1. Building a table...");
    {
        let options = Options::default().block_size(64);
        let mut writer = TableWriter::new(fs.create("fruit.sst")?, options)?;

        // Add key-value pairs (must be in sorted order)
        let entries = [
            ("apple", "A red or green fruit"),
            ("banana", "A yellow tropical fruit"),
            ("cherry", "A small red stone fruit"),
            ("date", "A sweet brown fruit from palm trees"),
            ("elderberry", "A dark purple berry"),
            ("fig", "A soft sweet fruit with many seeds"),
            ("grape", "A small round fruit that grows in clusters"),
        ];

        for (key, value) in entries {
            writer.set(key.as_bytes(), value.as_bytes())?;
        }

        let file_size = writer.close().context("finishing fruit.sst")?;
        println!("   Table created: {} bytes in {}", file_size, fs.path("fruit.sst").display());
        println!("   {} entries in {} blocks\n", writer.num_entries(), writer.num_blocks());
    }

    // === Part 2: Reading from the table ===
    println!("2. Reading from the table...");
    let reader = TableReader::open(fs.open("fruit.sst")?, Options::default())?;
    println!("   File size: {} bytes", reader.file_size());
    println!("   Number of blocks: {}\n", reader.num_blocks());

    for key in [&b"banana"[..], &b"fig"[..], &b"mango"[..]] {
        match reader.get(key) {
            Ok(value) => println!(
                "     '{}' -> '{}'",
                String::from_utf8_lossy(key),
                String::from_utf8_lossy(&value)
            ),
            Err(e) if e.is_not_found() => {
                println!("     '{}' -> NOT FOUND", String::from_utf8_lossy(key))
            }
            Err(e) => return Err(e.into()),
        }
    }
    println!();

    if let (Some(smallest), Some(largest)) = (reader.smallest_key()?, reader.largest_key()?) {
        println!(
            "   Key range: '{}' ..= '{}'\n",
            String::from_utf8_lossy(&smallest),
            String::from_utf8_lossy(&largest)
        );
    }

    // === Part 3: Range scan ===
    println!("3. Scanning from 'c'...");
    {
        let mut iter = reader.find(b"c")?;
        while iter.advance()? {
            println!(
                "     {} => {}",
                String::from_utf8_lossy(iter.key()),
                String::from_utf8_lossy(iter.value())
            );
        }
        iter.close()?;
    }
    reader.close()?;
    println!();

    // === Part 4: Ordering is enforced ===
    println!("4. Writing keys out of order...");
    {
        let mut writer = TableWriter::new(fs.create("broken.sst")?, Options::default())?;
        writer.set(b"b", b"2")?;
        match writer.set(b"a", b"1") {
            Err(Error::OutOfOrder { key, previous }) => {
                println!("   Rejected '{}' after '{}'", key, previous)
            }
            other => anyhow::bail!("expected an ordering error, got {:?}", other),
        }
        if writer.close().is_err() {
            println!("   The table was abandoned");
        }
    }

    std::fs::remove_dir_all(&dir)?;
    println!("\n=== Example completed ===");
    Ok(())
}
