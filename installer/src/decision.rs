//! Decision table driving a single `load`.
//!
//! A load is a short walk through artifact states. At each step the
//! preprocessor observes the [`ArtifactState`], and [`decide`] picks the next
//! [`Action`] from the split's origin, that state, and the [`Phase`] of the
//! call (how many bundle copies it has already made). Keeping the table here
//! makes every transition testable without touching the filesystem.
//!
//! | Origin     | State             | Phase              | Action                    |
//! |------------|-------------------|--------------------|---------------------------|
//! | built-in   | absent            | initial            | copy, then phase copied   |
//! | built-in   | present           | any                | verify                    |
//! | built-in   | verified          | any                | settle verified           |
//! | built-in   | quarantined       | initial            | copy, then phase recopied |
//! | built-in   | quarantined       | copied / recopied  | fail                      |
//! | built-in   | absent            | copied / recopied  | fail                      |
//! | downloaded | absent            | any                | settle not downloaded     |
//! | downloaded | present           | any                | verify                    |
//! | downloaded | verified          | any                | settle verified           |
//! | downloaded | quarantined       | any                | settle quarantined        |

use crate::split::SplitOrigin;

/// What is known about the artifact at a step of `load`.
///
/// Never persisted; each `load` derives it afresh from the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactState {
    /// No artifact on disk.
    Absent,
    /// An artifact exists but has not been checked during this call.
    PresentUnverified,
    /// The artifact passed verification during this call.
    PresentVerified,
    /// The artifact failed verification and its directory was deleted.
    Quarantined,
}

/// How many bundle copies the current `load` has performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No copy yet.
    Initial,
    /// Copied because the artifact was missing.
    Copied,
    /// Copied again because the existing artifact failed verification.
    Recopied,
}

/// Terminal, successful results of a `load`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// The artifact is present and verified.
    Verified,
    /// A downloaded split has no artifact yet.
    NotDownloaded,
    /// A downloaded split failed verification and was quarantined.
    Quarantined,
}

/// The next step of a `load`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Copy the split from the bundle, then continue in `next`.
    CopyFromBundle {
        /// Phase to continue in once the copy succeeds.
        next: Phase,
    },
    /// Run the signature check on the artifact.
    Verify,
    /// Stop with a successful result.
    Settle(Settlement),
    /// Stop: the built-in split cannot be made usable.
    Fail,
}

/// Choose the next action of a `load`.
///
/// # Examples
///
/// ```
/// use splitvault_installer::decision::{Action, ArtifactState, Phase, decide};
/// use splitvault_installer::split::SplitOrigin;
///
/// let action = decide(SplitOrigin::BuiltIn, ArtifactState::Quarantined, Phase::Initial);
/// assert_eq!(action, Action::CopyFromBundle { next: Phase::Recopied });
/// ```
#[must_use]
pub const fn decide(origin: SplitOrigin, state: ArtifactState, phase: Phase) -> Action {
    match (origin, state, phase) {
        (_, ArtifactState::PresentUnverified, _) => Action::Verify,
        (_, ArtifactState::PresentVerified, _) => Action::Settle(Settlement::Verified),

        (SplitOrigin::BuiltIn, ArtifactState::Absent, Phase::Initial) => Action::CopyFromBundle {
            next: Phase::Copied,
        },
        (SplitOrigin::BuiltIn, ArtifactState::Quarantined, Phase::Initial) => {
            Action::CopyFromBundle {
                next: Phase::Recopied,
            }
        }
        (
            SplitOrigin::BuiltIn,
            ArtifactState::Absent | ArtifactState::Quarantined,
            Phase::Copied | Phase::Recopied,
        ) => Action::Fail,

        (SplitOrigin::Downloaded, ArtifactState::Absent, _) => {
            Action::Settle(Settlement::NotDownloaded)
        }
        (SplitOrigin::Downloaded, ArtifactState::Quarantined, _) => {
            Action::Settle(Settlement::Quarantined)
        }
    }
}
