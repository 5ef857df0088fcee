//! Output formatting for the installer CLI.
//!
//! One line per split, `<split>: <result>`, so the output can be read by
//! people and split on `": "` by scripts.

use crate::flow::SplitStatus;
use crate::preprocessor::LoadOutcome;
use crate::split::SplitName;

/// Format the result of loading `split`.
///
/// # Example
///
/// ```
/// use splitvault_installer::output::outcome_line;
/// use splitvault_installer::preprocessor::LoadOutcome;
/// use splitvault_installer::split::SplitName;
///
/// let split = SplitName::new("java").unwrap();
/// assert_eq!(outcome_line(&split, &LoadOutcome::Verified), "java: verified");
/// ```
#[must_use]
pub fn outcome_line(split: &SplitName, outcome: &LoadOutcome) -> String {
    format!("{split}: {outcome}")
}

/// Format what is stored for `split`.
#[must_use]
pub fn status_line(split: &SplitName, status: SplitStatus) -> String {
    format!("{split}: {status}")
}

/// Format the closing message after loading `count` splits.
#[must_use]
pub fn load_summary(count: usize) -> String {
    let plural = if count == 1 { "split" } else { "splits" };
    format!("Prepared {count} {plural}")
}
