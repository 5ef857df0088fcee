//! Behaviour-driven tests for the split load procedure.
//!
//! These scenarios drive `SplitPreprocessor::load` against a temporary
//! storage root, an in-memory bundle, and a scripted validator. Tests use the
//! rstest-bdd v0.5.0 mutable world pattern.

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use splitvault_installer::error::PreprocessError;
use splitvault_installer::preprocessor::{LoadOutcome, PreprocessContext, SplitPreprocessor};
use splitvault_installer::split::{SplitInfo, SplitName};
use splitvault_installer::test_utils::{ScriptedValidator, StubBundle, TempStorage};
use std::fs;

const BUNDLED: &[u8] = b"bundled split bytes";
const STORED: &[u8] = b"previously stored bytes";

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

#[derive(Default)]
struct PreprocessWorld {
    storage: Option<TempStorage>,
    bundle: Option<StubBundle>,
    validator: Option<ScriptedValidator>,
    result: Option<Result<LoadOutcome, PreprocessError>>,
}

impl PreprocessWorld {
    fn storage(&self) -> &TempStorage {
        self.storage.as_ref().expect("storage set")
    }

    fn bundle(&self) -> &StubBundle {
        self.bundle.as_ref().expect("bundle set")
    }

    fn validator(&self) -> &ScriptedValidator {
        self.validator.as_ref().expect("validator set")
    }

    fn load(&mut self, split: &SplitInfo, close_first: bool) {
        let tmp_dir = self.storage().paths().tmp_dir();
        let context = PreprocessContext::new(self.validator(), self.bundle(), &tmp_dir);
        let mut preprocessor =
            SplitPreprocessor::open(self.storage().location(split.name())).expect("open");
        if close_first {
            preprocessor.close().expect("close");
        }
        let result = preprocessor.load(&context, split);
        self.result = Some(result);
    }

    fn error(&self) -> &PreprocessError {
        match self.result.as_ref().expect("load attempted") {
            Ok(outcome) => panic!("expected load to fail, got {outcome}"),
            Err(err) => err,
        }
    }
}

#[fixture]
fn world() -> PreprocessWorld {
    PreprocessWorld::default()
}

fn split_name(name: &str) -> SplitName {
    SplitName::new(name).expect("valid split name")
}

// ---------------------------------------------------------------------------
// Step definitions
// ---------------------------------------------------------------------------

#[given("empty split storage")]
fn given_empty_storage(world: &mut PreprocessWorld) {
    world.storage = Some(TempStorage::new().expect("temp storage"));
}

#[given("a stored artifact for split \"{name}\"")]
fn given_stored_artifact(world: &mut PreprocessWorld, name: String) {
    world
        .storage()
        .plant_artifact(&split_name(&name), STORED)
        .expect("plant artifact");
}

#[given("a bundle serving every split")]
fn given_bundle(world: &mut PreprocessWorld) {
    world.bundle = Some(StubBundle::new(BUNDLED));
}

#[given("a bundle that fails every read")]
fn given_failing_bundle(world: &mut PreprocessWorld) {
    world.bundle = Some(StubBundle::new(BUNDLED).failing_first(u32::MAX));
}

#[given("a validator that approves every artifact")]
fn given_approving_validator(world: &mut PreprocessWorld) {
    world.validator = Some(ScriptedValidator::always(true));
}

#[given("a validator that rejects every artifact")]
fn given_rejecting_validator(world: &mut PreprocessWorld) {
    world.validator = Some(ScriptedValidator::always(false));
}

#[given("a validator that rejects the first artifact only")]
fn given_validator_rejecting_once(world: &mut PreprocessWorld) {
    world.validator = Some(ScriptedValidator::new([false], true));
}

#[when("built-in split \"{name}\" is loaded")]
fn when_built_in_loaded(world: &mut PreprocessWorld, name: String) {
    world.load(&SplitInfo::built_in(split_name(&name)), false);
}

#[when("downloaded split \"{name}\" is loaded")]
fn when_downloaded_loaded(world: &mut PreprocessWorld, name: String) {
    world.load(&SplitInfo::downloaded(split_name(&name)), false);
}

#[when("split \"{name}\" is loaded after its preprocessor was closed")]
fn when_loaded_after_close(world: &mut PreprocessWorld, name: String) {
    world.load(&SplitInfo::built_in(split_name(&name)), true);
}

#[then("the outcome is \"{expected}\"")]
fn then_outcome_is(world: &mut PreprocessWorld, expected: String) {
    let result = world.result.as_ref().expect("load attempted");
    let outcome = result.as_ref().expect("load succeeded");
    assert_eq!(outcome.to_string(), expected);
}

#[then("loading fails because the split may be corrupted")]
fn then_verification_failed(world: &mut PreprocessWorld) {
    let err = world.error();
    assert!(matches!(err, PreprocessError::VerificationFailed { .. }));
    assert!(err.to_string().contains("corrupted"));
}

#[then("loading fails because the copy was exhausted")]
fn then_copy_failed(world: &mut PreprocessWorld) {
    assert!(matches!(
        world.error(),
        PreprocessError::CopyFailed { attempts: 3, .. }
    ));
}

#[then("loading fails because the lock was released")]
fn then_invalid_state(world: &mut PreprocessWorld) {
    assert!(matches!(
        world.error(),
        PreprocessError::InvalidState { .. }
    ));
}

#[then("the bundle was read {count} times")]
fn then_bundle_reads(world: &mut PreprocessWorld, count: u32) {
    assert_eq!(world.bundle().open_count(), count);
}

#[then("the validator was called {count} times")]
fn then_validator_calls(world: &mut PreprocessWorld, count: u32) {
    assert_eq!(world.validator().call_count(), count);
}

#[then("the scratch directory is empty")]
fn then_scratch_empty(world: &mut PreprocessWorld) {
    assert_eq!(world.storage().scratch_entries(), 0);
}

#[then("the artifact for split \"{name}\" holds the bundled bytes")]
fn then_artifact_is_bundled(world: &mut PreprocessWorld, name: String) {
    let location = world.storage().location(&split_name(&name));
    assert_eq!(fs::read(location.artifact()).expect("read artifact"), BUNDLED);
}

#[then("split \"{name}\" has no artifact")]
fn then_no_artifact(world: &mut PreprocessWorld, name: String) {
    assert!(!world.storage().location(&split_name(&name)).artifact_exists());
}

#[then("the directory of split \"{name}\" no longer exists")]
fn then_directory_removed(world: &mut PreprocessWorld, name: String) {
    let location = world.storage().location(&split_name(&name));
    assert!(!location.split_dir().exists());
}

// ---------------------------------------------------------------------------
// Scenario bindings
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/preprocess.feature",
    name = "Missing built-in split is copied from the bundle"
)]
fn scenario_missing_built_in_copied(world: PreprocessWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/preprocess.feature",
    name = "Corrupted built-in split heals with one re-copy"
)]
fn scenario_corrupt_built_in_heals(world: PreprocessWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/preprocess.feature",
    name = "Built-in split that never verifies fails the load"
)]
fn scenario_built_in_never_verifies(world: PreprocessWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/preprocess.feature",
    name = "Unreadable bundle fails the load after three reads"
)]
fn scenario_unreadable_bundle(world: PreprocessWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/preprocess.feature",
    name = "Corrupted downloaded split is quarantined"
)]
fn scenario_downloaded_quarantined(world: PreprocessWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/preprocess.feature",
    name = "Missing downloaded split is left alone"
)]
fn scenario_downloaded_missing(world: PreprocessWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/preprocess.feature",
    name = "Closed preprocessor refuses to load"
)]
fn scenario_closed_preprocessor(world: PreprocessWorld) {
    let _ = world;
}
