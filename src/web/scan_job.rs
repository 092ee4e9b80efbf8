// Scan job control — runs the CIS audit as a Kubernetes Job via kubectl.
//
// Starting a scan removes the previous results file, deletes any previous
// Job of the same name, and applies a fresh manifest. Status is read back
// from the Job's `status.succeeded` / `status.failed` counters.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::report::model::{JobState, ScanStatusResponse};

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Failed to delete results: {0}")]
    Cleanup(#[source] std::io::Error),
    #[error("Failed to run kubectl: {0}")]
    Spawn(#[source] std::io::Error),
    /// `kubectl apply` exited non-zero. Carries its stderr verbatim.
    #[error("{0}")]
    Apply(String),
}

/// The backend's handle on the scan job. Swapped for a fake in handler tests.
#[async_trait]
pub trait ScanJobs: Send + Sync {
    async fn start(&self) -> Result<(), JobError>;
    async fn status(&self) -> ScanStatusResponse;
}

/// Manifest for the audit Job. `{name}` and `{image}` are filled in per config.
const JOB_MANIFEST_TEMPLATE: &str = r#"apiVersion: batch/v1
kind: Job
metadata:
  name: {name}
spec:
  template:
    spec:
      nodeSelector:
        node-role.kubernetes.io/control-plane: ""
      tolerations:
      - key: "node-role.kubernetes.io/control-plane"
        operator: "Exists"
        effect: "NoSchedule"
      - operator: "Exists"
      hostPID: true
      hostNetwork: true
      serviceAccountName: audit-runner
      restartPolicy: Never
      containers:
        - name: check
          image: {image}
          imagePullPolicy: Always
          volumeMounts:
            - name: kubernetes
              mountPath: /etc/kubernetes
              readOnly: true
            - name: cni
              mountPath: /etc/cni/net.d
              readOnly: true
            - name: etcd
              mountPath: /var/lib/etcd
              readOnly: true
            - name: output
              mountPath: /output
      volumes:
        - name: kubernetes
          hostPath:
            path: /etc/kubernetes
        - name: cni
          hostPath:
            path: /etc/cni/net.d
        - name: etcd
          hostPath:
            path: /var/lib/etcd
        - name: output
          hostPath:
            path: /var/tmp/results
            type: DirectoryOrCreate
"#;

pub fn job_manifest(name: &str, image: &str) -> String {
    JOB_MANIFEST_TEMPLATE
        .replace("{name}", name)
        .replace("{image}", image)
}

/// The subset of `kubectl get job -o json` the status check reads.
#[derive(Debug, Default, Deserialize)]
struct JobObject {
    #[serde(default)]
    status: JobCounters,
}

#[derive(Debug, Default, Deserialize)]
struct JobCounters {
    #[serde(default)]
    succeeded: u32,
    #[serde(default)]
    failed: u32,
}

/// Interpret `kubectl get job -o json` output. Failure wins over success.
pub fn job_status_from_json(json: &str) -> ScanStatusResponse {
    match serde_json::from_str::<JobObject>(json) {
        Ok(job) => {
            let status = if job.status.failed > 0 {
                JobState::Failed
            } else if job.status.succeeded > 0 {
                JobState::Completed
            } else {
                JobState::Running
            };
            ScanStatusResponse {
                status,
                error: None,
            }
        }
        Err(e) => ScanStatusResponse {
            status: JobState::Error,
            error: Some(e.to_string()),
        },
    }
}

pub struct KubectlJobs {
    kubectl: String,
    job_name: String,
    namespace: String,
    manifest: String,
    results_path: PathBuf,
    /// Serializes start requests so two deletes/applies never interleave.
    start_lock: Mutex<()>,
}

impl KubectlJobs {
    pub fn from_config(config: &Config) -> Self {
        Self {
            kubectl: config.kubectl.clone(),
            job_name: config.job_name.clone(),
            namespace: config.namespace.clone(),
            manifest: job_manifest(&config.job_name, &config.job_image),
            results_path: config.results_path.clone(),
            start_lock: Mutex::new(()),
        }
    }

    async fn remove_results(&self) -> Result<(), JobError> {
        match tokio::fs::remove_file(&self.results_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(JobError::Cleanup(e)),
        }
    }
}

#[async_trait]
impl ScanJobs for KubectlJobs {
    async fn start(&self) -> Result<(), JobError> {
        let _guard = self.start_lock.lock().await;

        self.remove_results().await?;

        let delete = Command::new(&self.kubectl)
            .args(["delete", "job", self.job_name.as_str()])
            .args(["-n", self.namespace.as_str()])
            .arg("--ignore-not-found=true")
            .output()
            .await
            .map_err(JobError::Spawn)?;
        if !delete.status.success() {
            // Not fatal: apply below reports anything that actually matters.
            let stderr = String::from_utf8_lossy(&delete.stderr);
            warn!(stderr = %stderr.trim(), "kubectl delete job failed");
        }

        let mut child = Command::new(&self.kubectl)
            .args(["apply", "-f", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(JobError::Spawn)?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(self.manifest.as_bytes())
                .await
                .map_err(JobError::Spawn)?;
        }
        let applied = child.wait_with_output().await.map_err(JobError::Spawn)?;

        if !applied.status.success() {
            return Err(JobError::Apply(
                String::from_utf8_lossy(&applied.stderr).into_owned(),
            ));
        }

        info!(job = %self.job_name, namespace = %self.namespace, "Scan job applied");
        Ok(())
    }

    async fn status(&self) -> ScanStatusResponse {
        let output = Command::new(&self.kubectl)
            .args(["get", "job", self.job_name.as_str()])
            .args(["-n", self.namespace.as_str()])
            .args(["-o", "json"])
            .output()
            .await;

        match output {
            Ok(out) if out.status.success() => {
                job_status_from_json(&String::from_utf8_lossy(&out.stdout))
            }
            Ok(out) => {
                let stderr = String::from_utf8_lossy(&out.stderr);
                debug!(stderr = %stderr.trim(), "Scan job not found");
                ScanStatusResponse {
                    status: JobState::NotFound,
                    error: None,
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to run kubectl get job");
                ScanStatusResponse {
                    status: JobState::NotFound,
                    error: None,
                }
            }
        }
    }
}
