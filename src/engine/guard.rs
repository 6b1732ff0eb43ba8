//! Request guard
//!
//! Cross-checks the declared state against the engine and job actually
//! held. A mismatch is a bug in this crate, never bad input.

use super::error::{ControlError, Result};
use super::state::{ModelState, ServiceState};

/// Accept only the three consistent shapes of the state record
pub fn check(st: &ServiceState) -> Result<()> {
    let consistent = match (&st.state, &st.engine, &st.active_job) {
        (ModelState::Unloaded, None, None) => true,
        (ModelState::Loaded, Some(_), None) => true,
        (ModelState::Running(path), Some(_), Some(job)) => job.input_path == *path,
        _ => false,
    };
    if consistent {
        return Ok(());
    }

    Err(ControlError::Invariant(format!(
        "state is {} but engine is {} and {}",
        st.state,
        if st.engine.is_some() { "present" } else { "absent" },
        match &st.active_job {
            Some(job) => format!("job {} is active on {}", job.id, job.input_path.display()),
            None => "no job is active".to_string(),
        }
    )))
}
