use super::*;
use crate::foundation::error::BoilError;

struct Halve;

impl PostOptimizer for Halve {
    fn name(&self) -> &str {
        "halve"
    }

    fn optimize(&self, artifact: &[u8]) -> BoilResult<Vec<u8>> {
        Ok(artifact[..artifact.len() / 2].to_vec())
    }
}

struct Broken;

impl PostOptimizer for Broken {
    fn name(&self) -> &str {
        "broken"
    }

    fn optimize(&self, _artifact: &[u8]) -> BoilResult<Vec<u8>> {
        Err(BoilError::optimizer("exit status 1"))
    }
}

struct Empty;

impl PostOptimizer for Empty {
    fn name(&self) -> &str {
        "empty"
    }

    fn optimize(&self, _artifact: &[u8]) -> BoilResult<Vec<u8>> {
        Ok(Vec::new())
    }
}

#[test]
fn absent_optimizer_passes_through() {
    assert_eq!(refine(None, vec![1, 2, 3]), vec![1, 2, 3]);
}

#[test]
fn successful_optimizer_output_is_used() {
    assert_eq!(refine(Some(&Halve), vec![1, 2, 3, 4]), vec![1, 2]);
}

#[test]
fn failing_optimizer_is_swallowed() {
    assert_eq!(refine(Some(&Broken), vec![1, 2, 3]), vec![1, 2, 3]);
}

#[test]
fn empty_output_is_treated_as_failure() {
    assert_eq!(refine(Some(&Empty), vec![7, 8]), vec![7, 8]);
}
