//! Code signing with timestamp endpoint fallback.
//!
//! Signing needs a remote timestamp authority, and any single authority may be
//! unavailable. [`sign_with_fallback`] tries an ordered list of endpoints and
//! stops at the first one that works:
//! - Endpoints are tried strictly in list order, each with the full file set
//! - The first success wins; later endpoints are never contacted
//! - If every endpoint fails, the last endpoint's error is the one reported,
//!   with every attempt kept alongside it for diagnostics
//!
//! No state is kept between calls. Every call starts at the first endpoint.

mod signtool;

pub use signtool::{SignFiles, SignToolSigner};

use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use crate::action::ActionError;

/// Something that can sign files using a given timestamp endpoint.
pub trait Signer: Send + Sync {
  fn sign(&self, files: &[PathBuf], endpoint: &str) -> Result<(), ActionError>;
}

impl<F> Signer for F
where
  F: Fn(&[PathBuf], &str) -> Result<(), ActionError> + Send + Sync,
{
  fn sign(&self, files: &[PathBuf], endpoint: &str) -> Result<(), ActionError> {
    self(files, endpoint)
  }
}

/// Outcome of signing against one endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum AttemptOutcome {
  Success,
  Failure(String),
}

/// One endpoint tried during a single signing call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SigningAttempt {
  pub endpoint: String,
  pub outcome: AttemptOutcome,
}

/// Result of a successful signing call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SigningReport {
  /// The endpoint that succeeded.
  pub endpoint: String,

  /// Every endpoint tried, in order. The last entry is the success.
  pub attempts: Vec<SigningAttempt>,
}

/// Sign `files`, trying each endpoint in order until one succeeds.
///
/// # Errors
///
/// Returns `NoTimestampEndpoints` for an empty endpoint list, and
/// `AllEndpointsExhausted` carrying the last endpoint's error when every
/// endpoint fails.
pub fn sign_with_fallback<S, E>(signer: &S, files: &[PathBuf], endpoints: &[E]) -> Result<SigningReport, ActionError>
where
  S: Signer + ?Sized,
  E: AsRef<str>,
{
  let mut attempts = Vec::with_capacity(endpoints.len());
  let mut last_error = None;

  for endpoint in endpoints {
    let endpoint = endpoint.as_ref();
    info!(endpoint = %endpoint, file_count = files.len(), "signing");

    match signer.sign(files, endpoint) {
      Ok(()) => {
        attempts.push(SigningAttempt {
          endpoint: endpoint.to_string(),
          outcome: AttemptOutcome::Success,
        });
        info!(endpoint = %endpoint, attempt = attempts.len(), "signing succeeded");
        return Ok(SigningReport {
          endpoint: endpoint.to_string(),
          attempts,
        });
      }
      Err(e) => {
        warn!(endpoint = %endpoint, error = %e, "signing failed, trying next endpoint");
        attempts.push(SigningAttempt {
          endpoint: endpoint.to_string(),
          outcome: AttemptOutcome::Failure(e.to_string()),
        });
        last_error = Some(e);
      }
    }
  }

  match last_error {
    Some(last) => Err(ActionError::AllEndpointsExhausted {
      attempts,
      last: Box::new(last),
    }),
    None => Err(ActionError::NoTimestampEndpoints),
  }
}
