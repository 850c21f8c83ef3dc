use crate::release::VersionTag;

/// Bookkeeping of the one download in flight
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadSession {
    pub bytes_written: u64,
    pub bytes_expected: Option<u64>,
    pub target_tag: VersionTag,
    last_percent: Option<u8>,
}

impl DownloadSession {
    pub fn new(target_tag: VersionTag) -> Self {
        DownloadSession { bytes_written: 0, bytes_expected: None, target_tag, last_percent: None }
    }

    /// Last percentage handed out, never decreasing
    pub fn percent(&self) -> Option<u8> {
        self.last_percent
    }

    /// Returns the percentage to publish, if it moved forward.
    pub(crate) fn advance(&mut self, bytes_written: u64, bytes_expected: Option<u64>) -> Option<u8> {
        self.bytes_written = bytes_written;
        self.bytes_expected = bytes_expected;
        self.raise(progress_percent(bytes_written, bytes_expected)?)
    }

    pub(crate) fn complete(&mut self) -> Option<u8> {
        self.raise(100)
    }

    fn raise(&mut self, percent: u8) -> Option<u8> {
        match self.last_percent {
            Some(last) if percent <= last => None,
            _ => {
                self.last_percent = Some(percent);
                Some(percent)
            }
        }
    }
}

/// `None` while the total size is unknown
pub fn progress_percent(bytes_written: u64, bytes_expected: Option<u64>) -> Option<u8> {
    match bytes_expected {
        Some(expected) if expected > 0 => {
            Some((bytes_written.saturating_mul(100) / expected).min(100) as u8)
        }
        _ => None,
    }
}
