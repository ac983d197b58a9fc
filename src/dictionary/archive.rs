/*!
 * Zip archives in the Yomitan layout.
 *
 * Reading collects the entries of every `term_bank_*.json` file; the index,
 * tag banks and anything else in the archive are skipped. Writing produces
 * `index.json`, an empty `tag_bank_1.json` and as many term banks as the
 * chunk size requires.
 */

use log::debug;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::term_bank::{DictionaryEntry, DictionaryIndex, parse_term_bank};
use crate::errors::DictionaryError;

/// Entries per exported term bank
pub const TERM_BANK_CHUNK: usize = 10_000;

/// Whether a file inside an archive holds term entries
fn is_term_bank(name: &str) -> bool {
    let name = name.rsplit('/').next().unwrap_or(name);
    name.starts_with("term_bank") && name.ends_with(".json")
}

/// Read every term entry of an archive, in file order
pub fn read_archive(path: &Path) -> Result<Vec<DictionaryEntry>, DictionaryError> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;
    let mut entries = Vec::new();

    for i in 0..archive.len() {
        let mut member = archive.by_index(i)?;
        let name = member.name().to_string();
        if member.is_dir() || !is_term_bank(&name) {
            debug!("Skipping '{}'", name);
            continue;
        }

        let mut bytes = Vec::new();
        member.read_to_end(&mut bytes)?;
        let parsed = parse_term_bank(&bytes, &name)?;
        debug!("{}: {} entries", name, parsed.len());
        entries.extend(parsed);
    }

    Ok(entries)
}

/// Write `entries` as a complete archive at `path`, replacing any file there
///
/// Returns the number of term banks written.
pub fn write_archive(
    path: &Path,
    index: &DictionaryIndex,
    entries: &[DictionaryEntry],
    chunk_size: usize,
) -> Result<usize, DictionaryError> {
    let file = File::create(path)?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let index_json = serde_json::to_vec_pretty(index).map_err(|source| DictionaryError::Json {
        file: "index.json".to_string(),
        source,
    })?;
    zip.start_file("index.json", options)?;
    zip.write_all(&index_json)?;

    zip.start_file("tag_bank_1.json", options)?;
    zip.write_all(b"[]")?;

    let mut banks = 0;
    let mut sequence = 0_i64;
    for chunk in entries.chunks(chunk_size.max(1)) {
        banks += 1;
        let name = format!("term_bank_{}.json", banks);
        let bank: Vec<serde_json::Value> = chunk
            .iter()
            .map(|entry| {
                sequence += 1;
                entry.to_json(sequence)
            })
            .collect();
        let bytes = serde_json::to_vec(&bank).map_err(|source| DictionaryError::Json {
            file: name.clone(),
            source,
        })?;

        zip.start_file(name, options)?;
        zip.write_all(&bytes)?;
    }

    let mut writer = zip.finish()?;
    writer.flush()?;
    Ok(banks)
}
