// Shared fixtures for integration tests

#![allow(dead_code)]

use aitable::fs::{FileSystem, MemFile, MemFileSystem};
use aitable::{Options, TableReader, TableWriter};

/// Words per leading letter in the dictionary fixture.
///
/// The distribution matches the word list the range-count checks were
/// written against: 188 words start with a-b, 582 with c-j, 928 with k-x
/// and 12 with y-z.
pub const LETTER_COUNTS: [(u8, usize); 26] = [
    (b'a', 100),
    (b'b', 88),
    (b'c', 80),
    (b'd', 75),
    (b'e', 70),
    (b'f', 72),
    (b'g', 70),
    (b'h', 75),
    (b'i', 70),
    (b'j', 70),
    (b'k', 60),
    (b'l', 70),
    (b'm', 70),
    (b'n', 66),
    (b'o', 66),
    (b'p', 70),
    (b'q', 60),
    (b'r', 70),
    (b's', 80),
    (b't', 70),
    (b'u', 60),
    (b'v', 60),
    (b'w', 70),
    (b'x', 56),
    (b'y', 10),
    (b'z', 2),
];

pub const DICTIONARY_LEN: usize = 1710;

pub fn init_logging() {
    env_logger::builder().is_test(true).try_init().ok();
}

/// The dictionary fixture: lowercase words with 8-character counts, sorted.
pub fn dictionary() -> Vec<(String, String)> {
    let mut entries = Vec::with_capacity(DICTIONARY_LEN);
    for (letter, count) in LETTER_COUNTS {
        for i in 0..count {
            let mut word = String::with_capacity(5);
            word.push(letter as char);
            let mut n = i;
            let mut suffix = [b'a'; 4];
            for slot in suffix.iter_mut().rev() {
                *slot = b'a' + (n % 26) as u8;
                n /= 26;
            }
            word.push_str(std::str::from_utf8(&suffix).unwrap());

            let value = format!("{:>8}", (entries.len() * 7919) % 100_000);
            entries.push((word, value));
        }
    }
    entries
}

/// Build a table from sorted `entries` into `fs` under `name`.
pub fn build<K, V>(fs: &MemFileSystem, name: &str, entries: &[(K, V)], options: Options) -> u64
where
    K: AsRef<[u8]>,
    V: AsRef<[u8]>,
{
    let mut writer = TableWriter::new(fs.create(name).unwrap(), options).unwrap();
    for (key, value) in entries {
        writer.set(key.as_ref(), value.as_ref()).unwrap();
    }
    writer.close().unwrap()
}

/// Build `entries` into a fresh in-memory table and open it.
pub fn build_and_open<K, V>(
    entries: &[(K, V)],
    write: Options,
    read: Options,
) -> TableReader<MemFile>
where
    K: AsRef<[u8]>,
    V: AsRef<[u8]>,
{
    let fs = MemFileSystem::new();
    build(&fs, "table", entries, write);
    TableReader::open(fs.open("table").unwrap(), read).unwrap()
}

/// Count records from `start` to the end of the table.
pub fn count_from<R: aitable::Readable>(reader: &TableReader<R>, start: &[u8]) -> usize {
    let mut iter = reader.find(start).unwrap();
    let mut n = 0;
    while iter.advance().unwrap() {
        n += 1;
    }
    iter.close().unwrap();
    n
}
