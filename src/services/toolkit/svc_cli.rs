use async_trait::async_trait;
use log::{debug, info, warn};
use std::collections::VecDeque;
use std::ffi::OsString;
use std::process::Stdio;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command as TokioCommand;

use super::{ConfigParams, FeatureParams, InferParams, ResampleParams, SplitParams, Toolkit, TrainParams};
use crate::config::ToolkitConfig;
use crate::errors::{AppError, AppResult};

// Сколько последних строк stderr попадает в текст ошибки
const STDERR_TAIL_LINES: usize = 20;

/// Runs the toolkit through its `svc` command line.
#[derive(Debug, Clone)]
pub struct SvcCli {
    program: String,
    prefix_args: Vec<String>,
    device: Option<String>,
}

impl SvcCli {
    pub fn new(config: &ToolkitConfig) -> Self {
        Self {
            program: config.program.clone(),
            prefix_args: config.prefix_args.clone(),
            device: config.device.clone(),
        }
    }

    /// Executable plus the arguments that precede the subcommand
    fn invocation(&self) -> (String, Vec<String>) {
        match self.prefix_args.split_first() {
            Some((launcher, rest)) => {
                let mut args = rest.to_vec();
                args.push(self.program.clone());
                (launcher.clone(), args)
            }
            None => (self.program.clone(), Vec::new()),
        }
    }

    async fn run(&self, subcommand: &str, args: Vec<OsString>) -> AppResult<()> {
        let (executable, leading) = self.invocation();
        info!("Running svc {} ({} args)", subcommand, args.len());
        debug!("{} {} {} {:?}", executable, leading.join(" "), subcommand, args);

        let mut cmd = TokioCommand::new(&executable);
        cmd.args(&leading)
            .arg(subcommand)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            AppError::ToolkitError(format!("Failed to start '{}' for svc {}: {}", executable, subcommand, e))
        })?;

        let stdout_task = child.stdout.take().map(|stdout| {
            let tag = subcommand.to_string();
            tokio::spawn(async move {
                let mut reader = BufReader::new(stdout);
                while let Some(line) = next_line_lossy(&mut reader).await {
                    info!("svc {}: {}", tag, line);
                }
            })
        });

        // tqdm и логгер тулкита пишут в stderr, поэтому это не всегда ошибки
        let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
        if let Some(stderr) = child.stderr.take() {
            let mut reader = BufReader::new(stderr);
            while let Some(line) = next_line_lossy(&mut reader).await {
                debug!("svc {} stderr: {}", subcommand, line);
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
        }

        let status = child.wait().await?;
        if let Some(task) = stdout_task {
            let _ = task.await;
        }
        if !status.success() {
            let tail: Vec<String> = tail.into_iter().collect();
            warn!("svc {} exited with {}", subcommand, status);
            return Err(AppError::ToolkitError(format!(
                "svc {} failed with {}: {}",
                subcommand,
                status,
                tail.join("\n")
            )));
        }

        info!("svc {} finished", subcommand);
        Ok(())
    }
}

/// Next line of child output, decoded lossily.
///
/// Pipes are drained until EOF: a child writing into a closed pipe dies of EPIPE.
async fn next_line_lossy<R: AsyncBufRead + Unpin>(reader: &mut R) -> Option<String> {
    let mut buf = Vec::new();
    match reader.read_until(b'\n', &mut buf).await {
        Ok(0) => None,
        Ok(_) => {
            let line = String::from_utf8_lossy(&buf);
            Some(line.trim_end_matches(['\n', '\r']).to_string())
        }
        Err(e) => {
            warn!("Failed to read toolkit output: {}", e);
            None
        }
    }
}

fn flag(name: &str, value: impl ToString) -> [OsString; 2] {
    [OsString::from(name), OsString::from(value.to_string())]
}

fn path_flag(name: &str, value: &std::path::Path) -> [OsString; 2] {
    [OsString::from(name), value.as_os_str().to_os_string()]
}

pub(super) fn split_args(params: &SplitParams) -> Vec<OsString> {
    [
        path_flag("--input-dir", &params.input_dir),
        path_flag("--output-dir", &params.output_dir),
        flag("--sr", params.sr),
        flag("--max-length", params.max_length),
        flag("--top-db", params.top_db),
        flag("--frame-seconds", params.frame_seconds),
        flag("--hop-seconds", params.hop_seconds),
        flag("--n-jobs", params.n_jobs),
    ]
    .concat()
}

pub(super) fn resample_args(params: &ResampleParams) -> Vec<OsString> {
    [
        path_flag("--input-dir", &params.input_dir),
        path_flag("--output-dir", &params.output_dir),
        flag("--sampling-rate", params.sampling_rate),
        flag("--n-jobs", params.n_jobs),
        flag("--top-db", params.top_db),
        flag("--frame-seconds", params.frame_seconds),
        flag("--hop-seconds", params.hop_seconds),
    ]
    .concat()
}

pub(super) fn config_args(params: &ConfigParams) -> Vec<OsString> {
    [
        path_flag("--input-dir", &params.input_dir),
        path_flag("--filelist-path", &params.filelist_dir),
        path_flag("--config-path", &params.config_path),
        flag("--config-type", &params.config_type),
    ]
    .concat()
}

pub(super) fn feature_args(params: &FeatureParams) -> Vec<OsString> {
    [
        path_flag("--input-dir", &params.input_dir),
        path_flag("--config-path", &params.config_path),
        flag("--f0-method", params.f0_method),
        flag("--force-rebuild", params.force_rebuild),
    ]
    .concat()
}

pub(super) fn train_args(params: &TrainParams) -> Vec<OsString> {
    [
        path_flag("--config-path", &params.config_path),
        path_flag("--model-path", &params.model_path),
        flag("--tensorboard", false),
        flag("--reset-optimizer", params.reset_optimizer),
    ]
    .concat()
}

pub(super) fn infer_args(params: &InferParams, device: Option<&str>) -> Vec<OsString> {
    let mut args = vec![params.input_path.as_os_str().to_os_string()];
    args.extend(
        [
            path_flag("--output-path", &params.output_path),
            path_flag("--model-path", &params.model_path),
            path_flag("--config-path", &params.config_path),
            flag("--speaker", &params.speaker),
            flag("--transpose", params.transpose),
            flag("--auto-predict-f0", params.auto_predict_f0),
            flag("--cluster-infer-ratio", params.cluster_infer_ratio),
            flag("--noise-scale", params.noise_scale),
            flag("--f0-method", params.f0_method),
            flag("--db-thresh", params.db_thresh),
            flag("--pad-seconds", params.pad_seconds),
            flag("--chunk-seconds", params.chunk_seconds),
            flag("--absolute-thresh", params.absolute_thresh),
            flag("--max-chunk-seconds", params.max_chunk_seconds),
        ]
        .concat(),
    );
    if let Some(cluster) = &params.cluster_model_path {
        args.extend(path_flag("--cluster-model-path", cluster));
    }
    if let Some(device) = device {
        args.extend(flag("--device", device));
    }
    args
}

#[async_trait]
impl Toolkit for SvcCli {
    async fn split(&self, params: &SplitParams) -> AppResult<()> {
        self.run("pre-split", split_args(params)).await
    }

    async fn resample(&self, params: &ResampleParams) -> AppResult<()> {
        self.run("pre-resample", resample_args(params)).await
    }

    async fn generate_config(&self, params: &ConfigParams) -> AppResult<()> {
        self.run("pre-config", config_args(params)).await
    }

    async fn extract_features(&self, params: &FeatureParams) -> AppResult<()> {
        self.run("pre-hubert", feature_args(params)).await
    }

    async fn train(&self, params: &TrainParams) -> AppResult<()> {
        self.run("train", train_args(params)).await
    }

    async fn infer(&self, params: &InferParams) -> AppResult<()> {
        self.run("infer", infer_args(params, self.device.as_deref())).await
    }
}
