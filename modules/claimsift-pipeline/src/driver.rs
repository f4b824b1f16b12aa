//! Two-stage pipeline driver: verification, then classification.
//!
//! Each stage writes its artifact once, after the full pass. A stage
//! whose artifact already exists is a no-op returning the existing
//! path, so a re-run against the same output directory makes zero
//! network calls. Fatal setup failures return `None`; nothing here
//! panics or propagates per-claim errors.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};

use claimsift_common::{
    Claim, ClaimsiftError, ClassificationReport, FactCheckReport, VerifiedClaim,
};

use crate::classifier::{ClaimClassifier, MAX_CONTEXT_TOKENS};
use crate::verifier::ClaimVerifier;

pub struct PipelineDriver {
    verifier: ClaimVerifier,
    classifier: ClaimClassifier,
}

impl PipelineDriver {
    pub fn new(verifier: ClaimVerifier, classifier: ClaimClassifier) -> Self {
        Self {
            verifier,
            classifier,
        }
    }

    /// Run both stages. Returns the classification artifact path, or
    /// `None` on any unrecoverable setup failure.
    pub async fn run(
        &mut self,
        claims_path: &Path,
        fact_check_out: &Path,
        classification_out: &Path,
    ) -> Option<PathBuf> {
        let fact_check_path = self.run_verification(claims_path, fact_check_out).await?;
        self.run_classification(&fact_check_path, classification_out)
            .await
    }

    /// Stage 1: verify every claim in input order and persist the
    /// fact-check artifact.
    pub async fn run_verification(
        &mut self,
        claims_path: &Path,
        out_path: &Path,
    ) -> Option<PathBuf> {
        if out_path.exists() {
            info!(
                path = %out_path.display(),
                "Fact-check artifact already exists, skipping verification"
            );
            return Some(out_path.to_path_buf());
        }

        let claims = match load_claims(claims_path) {
            Ok(claims) => claims,
            Err(e) => {
                error!(error = %e, "Fact-check setup failed");
                return None;
            }
        };

        let total = claims.len();
        info!(
            total,
            max_api_calls = self.verifier.budget().ceiling(),
            "Processing claims"
        );

        let mut verified_claims = Vec::with_capacity(total);
        for (i, claim) in claims.iter().enumerate() {
            info!(
                n = i + 1,
                total,
                api_calls = self.verifier.budget().used(),
                "Verifying claim"
            );
            verified_claims.push(self.verifier.verify(claim).await);
        }

        log_verification_summary(&verified_claims, self.verifier.budget().used());

        let report = FactCheckReport {
            timestamp: Utc::now(),
            verified_claims,
        };
        if let Err(e) = write_artifact(out_path, &report) {
            error!(error = %e, "Failed to persist fact-check artifact");
            return None;
        }

        info!(path = %out_path.display(), "Fact-check results saved");
        Some(out_path.to_path_buf())
    }

    /// Stage 2: classify every verified claim and persist the
    /// classification artifact.
    pub async fn run_classification(
        &self,
        fact_check_path: &Path,
        out_path: &Path,
    ) -> Option<PathBuf> {
        if out_path.exists() {
            info!(
                path = %out_path.display(),
                "Classification artifact already exists, skipping classification"
            );
            return Some(out_path.to_path_buf());
        }

        let report = match load_fact_check(fact_check_path) {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "Classification setup failed");
                return None;
            }
        };

        let total = report.verified_claims.len();
        info!(total, model = self.classifier.model(), "Classifying claims");

        let mut classifications = Vec::with_capacity(total);
        for (i, verified) in report.verified_claims.iter().enumerate() {
            if verified.claim.is_empty() {
                warn!(n = i + 1, "Skipping claim with no text");
                continue;
            }
            info!(n = i + 1, total, "Classifying claim");
            classifications.push(self.classifier.classify(verified).await);
        }

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for record in &classifications {
            *counts.entry(record.label.to_string()).or_default() += 1;
        }
        info!(total = classifications.len(), ?counts, "Classification summary");

        let report = ClassificationReport {
            timestamp: Utc::now(),
            model_used: self.classifier.model().to_string(),
            max_tokens: MAX_CONTEXT_TOKENS,
            classifications,
        };
        if let Err(e) = write_artifact(out_path, &report) {
            error!(error = %e, "Failed to persist classification artifact");
            return None;
        }

        info!(path = %out_path.display(), "Classification results saved");
        Some(out_path.to_path_buf())
    }
}

fn load_claims(path: &Path) -> Result<Vec<Claim>, ClaimsiftError> {
    if !path.exists() {
        return Err(ClaimsiftError::InputNotFound(path.display().to_string()));
    }
    let raw = fs::read_to_string(path).map_err(|e| ClaimsiftError::InvalidInput {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let claims: Vec<Claim> =
        serde_json::from_str(&raw).map_err(|e| ClaimsiftError::InvalidInput {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
    if claims.is_empty() {
        return Err(ClaimsiftError::EmptyInput);
    }
    info!(path = %path.display(), count = claims.len(), "Loaded claims");
    Ok(claims)
}

fn load_fact_check(path: &Path) -> Result<FactCheckReport, ClaimsiftError> {
    if !path.exists() {
        return Err(ClaimsiftError::InputNotFound(path.display().to_string()));
    }
    let raw = fs::read_to_string(path).map_err(|e| ClaimsiftError::InvalidInput {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let report: FactCheckReport =
        serde_json::from_str(&raw).map_err(|e| ClaimsiftError::InvalidInput {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
    if report.verified_claims.is_empty() {
        return Err(ClaimsiftError::EmptyInput);
    }
    Ok(report)
}

fn write_artifact<T: Serialize>(path: &Path, value: &T) -> Result<(), ClaimsiftError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| ClaimsiftError::ArtifactWrite {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| ClaimsiftError::ArtifactWrite {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        }
    }
    fs::write(path, json).map_err(|e| ClaimsiftError::ArtifactWrite {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn log_verification_summary(verified: &[VerifiedClaim], api_calls: u32) {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for record in verified {
        *counts
            .entry(record.verification_result.to_string())
            .or_default() += 1;
    }
    info!(
        total = verified.len(),
        api_calls,
        ?counts,
        "Verification summary"
    );
}
