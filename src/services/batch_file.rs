use chrono::NaiveDate;

/// Fixed-width header layout, byte offsets (end-exclusive).
const NAME_RANGE: std::ops::Range<usize> = 0..29;
const DATE_RANGE: std::ops::Range<usize> = 29..37;
const TAG_RANGE: std::ops::Range<usize> = 37..45;
const COUNT_RANGE: std::ops::Range<usize> = 45..51;
const HEADER_LEN: usize = 51;

/// Data lines carry the card number between a 7-byte prefix and a 1-byte
/// suffix.
const LINE_PREFIX: usize = 7;
const LINE_SUFFIX: usize = 1;

const MIN_CARD_LEN: usize = 13;
const MAX_CARD_LEN: usize = 19;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum BatchFileError {
    #[error("Batch file is empty")]
    Empty,

    #[error("Batch header is shorter than {HEADER_LEN} bytes")]
    HeaderTooShort,

    #[error("Batch header carries a non-numeric processing date")]
    InvalidProcessingDate,

    #[error("Batch header carries a non-numeric record count")]
    InvalidRecordCount,
}

/// Header descriptor, one per file, discarded after ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchHeader {
    pub batch_name: String,
    pub processing_date: NaiveDate,
    pub batch_tag: String,
    pub expected_record_count: usize,
}

/// Parsed batch file: header plus a lazy, single-pass iteration over the
/// raw data lines. Restarting means re-parsing the input.
pub struct BatchFile<'a> {
    pub header: BatchHeader,
    lines: std::str::Lines<'a>,
}

impl<'a> BatchFile<'a> {
    /// Parses the header line eagerly; data lines are only touched as the
    /// iterator is driven. Header errors surface before any data line is
    /// consumed.
    pub fn parse(input: &'a str) -> Result<Self, BatchFileError> {
        let mut lines = input.lines();
        let header_line = lines.next().ok_or(BatchFileError::Empty)?;
        let header = parse_header(header_line)?;

        Ok(Self { header, lines })
    }
}

impl<'a> Iterator for BatchFile<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        self.lines.next()
    }
}

fn parse_header(line: &str) -> Result<BatchHeader, BatchFileError> {
    let bytes = line.as_bytes();
    if bytes.len() < HEADER_LEN {
        return Err(BatchFileError::HeaderTooShort);
    }

    let field = |range: std::ops::Range<usize>| {
        String::from_utf8_lossy(&bytes[range]).trim().to_string()
    };

    let batch_name = field(NAME_RANGE);

    let processing_date = NaiveDate::parse_from_str(&field(DATE_RANGE), "%Y%m%d")
        .map_err(|_| BatchFileError::InvalidProcessingDate)?;

    let batch_tag = field(TAG_RANGE);

    let expected_record_count = field(COUNT_RANGE)
        .parse::<usize>()
        .map_err(|_| BatchFileError::InvalidRecordCount)?;

    Ok(BatchHeader {
        batch_name,
        processing_date,
        batch_tag,
        expected_record_count,
    })
}

/// Extracts the embedded card number from a data line: strip the prefix
/// and suffix, trim, and accept only plausible lengths. Lines outside the
/// bounds yield None and are skipped by the caller.
pub fn extract_card_number(line: &str) -> Option<String> {
    let bytes = line.as_bytes();
    if bytes.len() <= LINE_PREFIX + LINE_SUFFIX {
        return None;
    }

    let number = String::from_utf8_lossy(&bytes[LINE_PREFIX..bytes.len() - LINE_SUFFIX])
        .trim()
        .to_string();

    if (MIN_CARD_LEN..=MAX_CARD_LEN).contains(&number.len()) {
        Some(number)
    } else {
        None
    }
}
