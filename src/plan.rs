use crate::error::Error;
use crate::rip::RipOptions;
use crate::selection::Selection;

/// Replaced in output filenames by the two-digit title number.
pub const TITLE_PLACEHOLDER: &str = "%title%";

/// Substitutes [`TITLE_PLACEHOLDER`] in `filename`.
///
/// Numeric titles are zero-padded to two digits so batch outputs sort.
pub fn expand_placeholder(filename: &str, title: &str) -> String {
    let title = match title.parse::<u32>() {
        Ok(n) => format!("{:02}", n),
        Err(_) => title.to_string(),
    };
    filename.replace(TITLE_PLACEHOLDER, &title)
}

/// One rip in a batch. `None` fields are left for the selection to fill in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRip {
    pub title: Option<String>,
    pub filename: Option<String>,
}

impl PlannedRip {
    /// Merges this rip into `base`, defaults from `selection`, then expands the filename.
    pub fn options(&self, base: &RipOptions, selection: Option<&Selection>) -> RipOptions {
        let mut options = base.clone();
        if let Some(title) = &self.title {
            options = options.title(title);
        }
        if let Some(selection) = selection {
            options = options.with_defaults_from(selection);
        }
        if let Some(filename) = &self.filename {
            let expanded = match options.title_id() {
                Some(title) => expand_placeholder(filename, title),
                None => filename.clone(),
            };
            options = options.filename(expanded);
        }
        options
    }
}

/// Pairs requested titles with output filenames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RipPlan {
    rips: Vec<PlannedRip>,
}

impl RipPlan {
    /// # Errors
    ///
    /// - `Error::AutoWithMultipleFilenames` if `auto` and more than one filename.
    /// - `Error::FilenameCountMismatch` if the counts differ and the first
    ///   filename has no `%title%` placeholder to share across titles.
    pub fn new(titles: &[String], filenames: &[String], auto: bool) -> Result<Self, Error> {
        if auto && filenames.len() > 1 {
            return Err(Error::AutoWithMultipleFilenames);
        }

        if titles.is_empty() {
            if filenames.len() > 1 {
                return Err(Error::FilenameCountMismatch {
                    titles: 1,
                    filenames: filenames.len(),
                });
            }
            return Ok(RipPlan {
                rips: vec![PlannedRip {
                    title: None,
                    filename: filenames.first().cloned(),
                }],
            });
        }

        let filenames: Vec<String> = if filenames.len() == titles.len() {
            filenames.to_vec()
        } else {
            match filenames.first() {
                Some(f) if f.contains(TITLE_PLACEHOLDER) => vec![f.clone(); titles.len()],
                _ => {
                    return Err(Error::FilenameCountMismatch {
                        titles: titles.len(),
                        filenames: filenames.len(),
                    });
                }
            }
        };

        let rips = titles
            .iter()
            .zip(filenames)
            .map(|(title, filename)| PlannedRip {
                title: Some(title.clone()),
                filename: Some(filename),
            })
            .collect();
        Ok(RipPlan { rips })
    }

    /// Drops the first `n` rips, to resume an interrupted batch.
    pub fn start_at(mut self, n: usize) -> Self {
        self.rips.drain(..n.min(self.rips.len()));
        self
    }

    pub fn rips(&self) -> &[PlannedRip] {
        &self.rips
    }
}
