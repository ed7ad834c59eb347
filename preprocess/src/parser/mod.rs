//! Chunked CSV reader for the monthly inventory extracts.
//!
//! Extracts are decoded through [`TranscodingReader`] (BOM stripped, legacy
//! encodings converted to UTF-8) and deserialized into [`InventoryRecord`]s
//! in chunks of a fixed number of rows, so memory stays bounded by the chunk
//! size whatever the file size.

use encoding_rs::{Decoder, Encoding, GB18030, UTF_8};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::InventoryError;
use crate::models::{InventoryRecord, INVENTORY_COLUMNS};

/// Bytes inspected for encoding detection.
const SAMPLE_SIZE: usize = 64 * 1024;

/// Raw bytes decoded per read from the underlying file.
const READ_BUFFER_SIZE: usize = 8 * 1024;

/// CSV parsing error with context
#[derive(Debug, Clone)]
pub struct CsvError {
    pub line: usize,
    pub column: Option<String>,
    pub message: String,
}

impl std::fmt::Display for CsvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.column {
            Some(col) => write!(f, "Line {}, column '{}': {}", self.line, col, self.message),
            None => write!(f, "Line {}: {}", self.line, self.message),
        }
    }
}

impl std::error::Error for CsvError {}

impl CsvError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column: None,
            message: message.into(),
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }
}

impl From<csv::Error> for CsvError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line() as usize).unwrap_or(0);
        CsvError::new(line, err.to_string())
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Detect the encoding of the first bytes of a file.
///
/// A byte-order mark wins. Otherwise UTF-8 is preferred whenever the sample
/// is valid UTF-8 (a character cut at the end of the sample is tolerated),
/// and chardet decides between legacy encodings. Unknown legacy charsets
/// fall back to GB18030, the superset used by the ERP exports.
pub fn detect_encoding(sample: &[u8]) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(sample) {
        return encoding;
    }

    match std::str::from_utf8(sample) {
        Ok(_) => return UTF_8,
        Err(e) if e.error_len().is_none() => return UTF_8,
        Err(_) => {}
    }

    let owned = sample.to_vec();
    let (charset, _confidence, _language) = chardet::detect(&owned);
    let label = chardet::charset2encoding(&charset);

    match Encoding::for_label(label.as_bytes()) {
        Some(encoding) if encoding != UTF_8 => encoding,
        _ => GB18030,
    }
}

/// Reader adapter yielding UTF-8 bytes from any supported encoding.
pub struct TranscodingReader<R> {
    inner: R,
    decoder: Decoder,
    raw: Vec<u8>,
    decoded: String,
    pos: usize,
    finished: bool,
}

impl<R: Read> TranscodingReader<R> {
    pub fn new(inner: R, encoding: &'static Encoding) -> Self {
        Self {
            inner,
            decoder: encoding.new_decoder_with_bom_removal(),
            raw: vec![0; READ_BUFFER_SIZE],
            decoded: String::new(),
            pos: 0,
            finished: false,
        }
    }

    fn fill(&mut self) -> io::Result<()> {
        let n = self.inner.read(&mut self.raw)?;
        let last = n == 0;

        self.decoded.clear();
        self.pos = 0;

        let needed = self
            .decoder
            .max_utf8_buffer_length(n)
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "decoded chunk too large"))?;
        self.decoded.reserve(needed);
        let _ = self.decoder.decode_to_string(&self.raw[..n], &mut self.decoded, last);

        self.finished = last;
        Ok(())
    }
}

impl<R: Read> Read for TranscodingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pos >= self.decoded.len() {
            if self.finished || buf.is_empty() {
                return Ok(0);
            }
            self.fill()?;
        }

        let available = &self.decoded.as_bytes()[self.pos..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.pos += n;
        Ok(n)
    }
}

// =============================================================================
// Chunked records
// =============================================================================

/// Iterator over chunks of at most `chunk_size` deserialized rows.
pub struct InventoryChunks<R: Read> {
    records: csv::DeserializeRecordsIntoIter<R, InventoryRecord>,
    chunk_size: usize,
    rows_read: usize,
}

impl<R: Read> InventoryChunks<R> {
    /// Read the header row and check that every required column is present.
    pub fn new(reader: R, chunk_size: usize) -> Result<Self, CsvError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers().map_err(CsvError::from)?;
        if let Some(missing) = INVENTORY_COLUMNS
            .iter()
            .find(|column| !headers.iter().any(|h| h == **column))
        {
            return Err(CsvError::new(1, "Missing required column").with_column(*missing));
        }

        Ok(Self {
            records: reader.into_deserialize(),
            chunk_size: chunk_size.max(1),
            rows_read: 0,
        })
    }

    /// Rows yielded so far.
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }
}

impl<R: Read> Iterator for InventoryChunks<R> {
    type Item = Result<Vec<InventoryRecord>, CsvError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut chunk = Vec::with_capacity(self.chunk_size.min(READ_BUFFER_SIZE));

        for result in self.records.by_ref() {
            match result {
                Ok(record) => {
                    chunk.push(record);
                    if chunk.len() >= self.chunk_size {
                        break;
                    }
                }
                Err(e) => return Some(Err(CsvError::from(e))),
            }
        }

        if chunk.is_empty() {
            None
        } else {
            self.rows_read += chunk.len();
            Some(Ok(chunk))
        }
    }
}

/// An opened monthly extract.
pub struct InventoryFile {
    pub encoding: &'static Encoding,
    pub chunks: InventoryChunks<TranscodingReader<File>>,
}

/// Open an extract, detect its encoding and validate its header row.
pub fn open_inventory_file(path: &Path, chunk_size: usize) -> Result<InventoryFile, InventoryError> {
    if !path.exists() {
        return Err(InventoryError::MissingSourceFile(path.to_path_buf()));
    }

    let mut file = File::open(path)?;
    let mut sample = Vec::with_capacity(SAMPLE_SIZE);
    (&mut file).take(SAMPLE_SIZE as u64).read_to_end(&mut sample)?;
    file.seek(SeekFrom::Start(0))?;

    let encoding = detect_encoding(&sample);
    let chunks = InventoryChunks::new(TranscodingReader::new(file, encoding), chunk_size)
        .map_err(|e| match e.column {
            Some(column) => InventoryError::MissingColumn {
                path: path.to_path_buf(),
                column,
            },
            None => InventoryError::Csv(e),
        })?;

    Ok(InventoryFile { encoding, chunks })
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::GBK;

    const HEADER: &str = "Channel 2,产品品牌,产品大分类,产品中分类,运营基准,产品季节,预计库存金额";

    fn sample_csv(rows: usize) -> String {
        let mut csv = String::from(HEADER);
        for i in 0..rows {
            csv.push_str(&format!("\nFRS,MLB,饰品,Shoes,,24FW,{}", i));
        }
        csv
    }

    #[test]
    fn test_chunks_respect_size() {
        let csv = sample_csv(5);
        let chunks: Vec<Vec<InventoryRecord>> = InventoryChunks::new(csv.as_bytes(), 2)
            .unwrap()
            .map(|c| c.unwrap())
            .collect();

        let sizes: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(chunks[2][0].amount, Some(4.0));
    }

    #[test]
    fn test_chunk_size_equal_to_rows() {
        let csv = sample_csv(4);
        let mut chunks = InventoryChunks::new(csv.as_bytes(), 4).unwrap();
        assert_eq!(chunks.next().unwrap().unwrap().len(), 4);
        assert!(chunks.next().is_none());
        assert_eq!(chunks.rows_read(), 4);
    }

    #[test]
    fn test_blank_amount_is_none() {
        let csv = format!("{}\nHQ,MLB,饰品,Bag,INTRO,,", HEADER);
        let chunk = InventoryChunks::new(csv.as_bytes(), 10).unwrap().next().unwrap().unwrap();
        assert_eq!(chunk[0].amount, None);
        assert_eq!(chunk[0].amount_or_zero(), 0.0);
        assert_eq!(chunk[0].operation_basis, "INTRO");
    }

    #[test]
    fn test_extra_columns_ignored() {
        let csv = "Store,Channel 2,产品品牌,产品大分类,产品中分类,运营基准,产品季节,预计库存金额,Qty\n\
                   S01,OR,DISCOVERY,饰品,Headwear,FOCUS,25SS,12.5,3";
        let chunk = InventoryChunks::new(csv.as_bytes(), 10).unwrap().next().unwrap().unwrap();
        assert_eq!(chunk[0].channel, "OR");
        assert_eq!(chunk[0].brand, "DISCOVERY");
        assert_eq!(chunk[0].amount, Some(12.5));
    }

    #[test]
    fn test_missing_column_rejected() {
        let csv = "Channel 2,产品品牌,产品大分类,产品中分类,运营基准,产品季节\nFRS,MLB,饰品,Shoes,,24FW";
        let err = InventoryChunks::new(csv.as_bytes(), 10).err().unwrap();
        assert_eq!(err.column.as_deref(), Some("预计库存金额"));
    }

    #[test]
    fn test_malformed_amount_is_error() {
        let csv = format!("{}\nFRS,MLB,饰品,Shoes,,24FW,abc", HEADER);
        let mut chunks = InventoryChunks::new(csv.as_bytes(), 10).unwrap();
        let err = chunks.next().unwrap().unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_detect_utf8_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(HEADER.as_bytes());
        assert_eq!(detect_encoding(&bytes), UTF_8);
    }

    #[test]
    fn test_detect_plain_utf8_with_cut_character() {
        let bytes = HEADER.as_bytes();
        // "预" is three bytes; cut inside it
        let cut = HEADER.find('预').unwrap() + 1;
        assert_eq!(detect_encoding(&bytes[..cut]), UTF_8);
    }

    #[test]
    fn test_detect_legacy_encoding() {
        let text = sample_csv(50);
        let (bytes, _, _) = GBK.encode(&text);
        assert_ne!(detect_encoding(&bytes), UTF_8);
    }

    #[test]
    fn test_bom_removed_before_header() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(sample_csv(1).as_bytes());

        let reader = TranscodingReader::new(bytes.as_slice(), UTF_8);
        let chunk = InventoryChunks::new(reader, 10).unwrap().next().unwrap().unwrap();
        assert_eq!(chunk[0].channel, "FRS");
    }

    #[test]
    fn test_transcode_gbk() {
        let text = sample_csv(3000);
        let (bytes, _, _) = GBK.encode(&text);

        let mut reader = TranscodingReader::new(&bytes[..], GBK);
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out, text);
    }

    #[test]
    fn test_error_message_format() {
        let err = CsvError::new(5, "Missing required column").with_column("预计库存金额");
        assert_eq!(err.to_string(), "Line 5, column '预计库存金额': Missing required column");
        assert_eq!(CsvError::new(9, "bad row").to_string(), "Line 9: bad row");
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_inventory_file(&dir.path().join("2025.01.csv"), 10).err().unwrap();
        assert!(matches!(err, InventoryError::MissingSourceFile(_)));
    }

    #[test]
    fn test_open_file_reports_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2025.01.csv");
        std::fs::write(&path, "Channel 2,产品品牌\nFRS,MLB").unwrap();

        let err = open_inventory_file(&path, 10).err().unwrap();
        assert!(matches!(err, InventoryError::MissingColumn { ref column, .. } if column == "产品大分类"));
    }
}
