/*!
 * Yomitan dictionary archives.
 *
 * Gets a dictionary into the table the translator works on, and the
 * translated column back out as an archive a dictionary reader can load:
 * - `term_bank`: entry and index types, JSON shapes
 * - `archive`: zip reading and writing
 * - `transfer`: import into and export from an SQLite database
 */

pub mod archive;
pub mod term_bank;
pub mod transfer;

pub use self::archive::{TERM_BANK_CHUNK, read_archive, write_archive};
pub use self::term_bank::{DictionaryEntry, DictionaryIndex, parse_term_bank};
pub use self::transfer::{
    DictionaryTable, ExportSummary, ImportSummary, export_dictionary, import_archives,
};
