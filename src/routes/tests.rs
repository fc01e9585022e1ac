//! End-to-end tests over a real listener with a fake toolkit and TTS.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;

use super::{router, AppState};
use crate::config::{AppConfig, StorageConfig};
use crate::errors::{AppError, AppResult};
use crate::services::layout::ModelLayout;
use crate::services::toolkit::{
    ConfigParams, FeatureParams, InferParams, ResampleParams, SplitParams, Toolkit, TrainParams,
};
use crate::services::tts::{AudioFormat, SpeechSynthesizer};

fn write_tone(path: &Path, samples: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..samples {
        writer.write_sample(((i % 64) as i16 - 32) * 256).unwrap();
    }
    writer.finalize().unwrap();
}

fn wav_bytes(samples: u32) -> Vec<u8> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.wav");
    write_tone(&path, samples);
    fs::read(path).unwrap()
}

fn copy_tree(from: &Path, to: &Path) -> AppResult<()> {
    for entry in WalkDir::new(from).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(from).map_err(|e| AppError::Unknown(e.to_string()))?;
        let target = to.join(relative);
        fs::create_dir_all(target.parent().unwrap_or(to))?;
        fs::copy(entry.path(), target)?;
    }
    Ok(())
}

/// Records calls and leaves behind the files the real toolkit would write.
#[derive(Default)]
struct FakeToolkit {
    calls: Mutex<Vec<&'static str>>,
    fail_train: bool,
    train_delay: Option<Duration>,
}

impl FakeToolkit {
    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Toolkit for FakeToolkit {
    async fn split(&self, params: &SplitParams) -> AppResult<()> {
        self.record("split");
        assert!(params.output_dir.is_dir(), "split output must exist beforehand");
        copy_tree(&params.input_dir, &params.output_dir)
    }

    async fn resample(&self, params: &ResampleParams) -> AppResult<()> {
        self.record("resample");
        assert!(params.output_dir.is_dir(), "resample output must exist beforehand");
        copy_tree(&params.input_dir, &params.output_dir)
    }

    async fn generate_config(&self, params: &ConfigParams) -> AppResult<()> {
        self.record("generate_config");
        fs::create_dir_all(&params.filelist_dir)?;
        fs::write(
            &params.config_path,
            r#"{"train": {"epochs": 10000, "batch_size": 16, "seed": 1234}, "spk": {"alice": 0}}"#,
        )?;
        Ok(())
    }

    async fn extract_features(&self, params: &FeatureParams) -> AppResult<()> {
        self.record("extract_features");
        assert!(params.force_rebuild);
        Ok(())
    }

    async fn train(&self, params: &TrainParams) -> AppResult<()> {
        self.record("train");
        if let Some(delay) = self.train_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_train {
            return Err(AppError::ToolkitError("svc train failed with exit status: 1".into()));
        }
        let config: Value = serde_json::from_str(&fs::read_to_string(&params.config_path)?)?;
        let epochs = config["train"]["epochs"].as_u64().unwrap_or(1);
        fs::create_dir_all(&params.model_path)?;
        for name in ["G_0.pth".to_string(), format!("G_{}.pth", epochs), format!("D_{}.pth", epochs + 1)] {
            fs::write(params.model_path.join(name), b"weights")?;
        }
        Ok(())
    }

    async fn infer(&self, params: &InferParams) -> AppResult<()> {
        self.record("infer");
        fs::copy(&params.input_path, &params.output_path)?;
        Ok(())
    }
}

/// Writes a short WAV and remembers what it was asked to say.
#[derive(Default)]
struct FakeTts {
    requests: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl SpeechSynthesizer for FakeTts {
    fn output_format(&self) -> AudioFormat {
        AudioFormat::Wav
    }

    async fn synthesize(&self, text: &str, lang: &str, destination: &Path) -> AppResult<()> {
        self.requests.lock().unwrap().push((text.to_string(), lang.to_string()));
        write_tone(destination, 1600);
        Ok(())
    }
}

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    toolkit: Arc<FakeToolkit>,
    tts: Arc<FakeTts>,
    dir: TempDir,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with(FakeToolkit::default()).await
    }

    async fn start_with(toolkit: FakeToolkit) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.storage.base_dir = dir.path().to_path_buf();
        config.server.workers = 2;
        config.storage.ensure_dirs().unwrap();

        let toolkit = Arc::new(toolkit);
        let tts = Arc::new(FakeTts::default());
        let app = router(AppState::new(config, toolkit.clone(), tts.clone()));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            client: reqwest::Client::new(),
            toolkit,
            tts,
            dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn storage(&self) -> StorageConfig {
        StorageConfig {
            base_dir: self.dir.path().to_path_buf(),
        }
    }

    /// A model directory as training would leave it, with checkpoints up to `epoch`
    fn seed_model(&self, model_id: &str, epoch: u64) -> ModelLayout {
        let layout = ModelLayout::new(&self.storage(), model_id).unwrap();
        fs::create_dir_all(layout.log_dir()).unwrap();
        fs::create_dir_all(layout.config_path().parent().unwrap()).unwrap();
        fs::write(layout.config_path(), "{}").unwrap();
        fs::write(layout.log_dir().join("G_0.pth"), b"").unwrap();
        fs::write(layout.log_dir().join(format!("G_{}.pth", epoch)), b"").unwrap();
        layout
    }

    async fn post_form(&self, path: &str, form: Form) -> reqwest::Response {
        self.client.post(self.url(path)).multipart(form).send().await.unwrap()
    }

    fn session_files(&self) -> Vec<PathBuf> {
        fs::read_dir(self.storage().files_dir())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect()
    }
}

fn file_part(name: &str, bytes: Vec<u8>) -> Part {
    Part::bytes(bytes).file_name(name.to_string())
}

fn training_form(file_name: &str, bytes: Vec<u8>, epochs: &str, f0_method: &str) -> Form {
    Form::new()
        .text("name", "alice")
        .text("epochs_number", epochs.to_string())
        .text("f0_method", f0_method.to_string())
        .text("user_id", "user-1")
        .text("trainAt", "2024-05-01T10:00:00")
        .part("file", file_part(file_name, bytes))
}

fn dataset_zip() -> Vec<u8> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut cursor);
        for name in ["alice/001.wav", "alice/002.wav"] {
            zip.start_file(name, SimpleFileOptions::default()).unwrap();
            zip.write_all(&wav_bytes(800)).unwrap();
        }
        zip.finish().unwrap();
    }
    cursor.into_inner()
}

fn docx(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    );
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut cursor);
        zip.start_file("word/document.xml", SimpleFileOptions::default()).unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    cursor.into_inner()
}

async fn detail(response: reqwest::Response) -> String {
    let body: Value = response.json().await.unwrap();
    body["detail"].as_str().unwrap_or_default().to_string()
}

fn assert_wav_attachment(response: &reqwest::Response) {
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["content-type"], "audio/wav");
    assert_eq!(headers["content-disposition"], "attachment; filename=\"output.wav\"");
}

#[tokio::test]
async fn test_text_to_speech_returns_wav() {
    let server = TestServer::start().await;
    let response = server
        .client
        .post(server.url("/text-to-speech/"))
        .json(&serde_json::json!({"text": "Xin chào", "locate": "vi"}))
        .send()
        .await
        .unwrap();

    assert_wav_attachment(&response);
    let body = response.bytes().await.unwrap();
    assert_eq!(&body[..4], b"RIFF");
    assert_eq!(
        server.tts.requests.lock().unwrap().as_slice(),
        &[("Xin chào".to_string(), "vi".to_string())]
    );
    assert_eq!(server.session_files().len(), 1);
}

#[tokio::test]
async fn test_text_to_speech_rejects_empty_text_and_bad_json() {
    let server = TestServer::start().await;
    let response = server
        .client
        .post(server.url("/text-to-speech/"))
        .json(&serde_json::json!({"text": "   ", "locate": "vi"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(detail(response).await, "No text to speak");

    let response = server
        .client
        .post(server.url("/text-to-speech/"))
        .json(&serde_json::json!({"text": "hello"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(!detail(response).await.is_empty());
    assert!(server.tts.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_text_file_to_speech_txt_uses_default_locale() {
    let server = TestServer::start().await;
    let form = Form::new().part("file", file_part("story.txt", "Once upon a time".as_bytes().to_vec()));
    let response = server.post_form("/text-file-to-speech/", form).await;

    assert_wav_attachment(&response);
    assert_eq!(
        server.tts.requests.lock().unwrap().as_slice(),
        &[("Once upon a time".to_string(), "vi".to_string())]
    );
}

#[tokio::test]
async fn test_text_file_to_speech_docx_joins_paragraphs() {
    let server = TestServer::start().await;
    let form = Form::new()
        .text("locate", "en")
        .part("file", file_part("story.docx", docx(&["First line", "Second line"])));
    let response = server.post_form("/text-file-to-speech/", form).await;

    assert_wav_attachment(&response);
    assert_eq!(
        server.tts.requests.lock().unwrap().as_slice(),
        &[("First line\nSecond line".to_string(), "en".to_string())]
    );
}

#[tokio::test]
async fn test_text_file_to_speech_rejects_other_formats() {
    let server = TestServer::start().await;
    let form = Form::new().part("file", file_part("story.pdf", b"%PDF-1.4".to_vec()));
    let response = server.post_form("/text-file-to-speech/", form).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(detail(response).await, "Invalid file format.");

    let response = server.post_form("/text-file-to-speech/", Form::new().text("locate", "vi")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(detail(response).await, "Field 'file' is required");
    assert!(server.tts.requests.lock().unwrap().is_empty());
    // неудачные загрузки не оставляют временных файлов
    assert!(server.session_files().is_empty());
}

#[tokio::test]
async fn test_infer_audio_with_missing_model() {
    let server = TestServer::start().await;
    let form = Form::new()
        .text("model_id", "ghost_10_deadbeef")
        .part("file", file_part("take.wav", wav_bytes(800)));
    let response = server.post_form("/infer-audio/", form).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(detail(response).await.starts_with("Model directory not found at"));
    assert!(server.toolkit.calls().is_empty());
}

#[tokio::test]
async fn test_infer_audio_without_checkpoint() {
    let server = TestServer::start().await;
    let layout = ModelLayout::new(&server.storage(), "alice_10_00000001").unwrap();
    fs::create_dir_all(layout.log_dir()).unwrap();
    fs::write(layout.log_dir().join("D_10.pth"), b"").unwrap();

    let form = Form::new()
        .text("model_id", "alice_10_00000001")
        .part("file", file_part("take.wav", wav_bytes(800)));
    let response = server.post_form("/infer-audio/", form).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(detail(response).await, "No G_*.pth model file found");
}

#[tokio::test]
async fn test_infer_audio_converts_upload() {
    let server = TestServer::start().await;
    server.seed_model("alice_10_00000001", 10);
    let input = wav_bytes(800);

    let form = Form::new()
        .text("model_id", "alice_10_00000001")
        .part("file", file_part("take.wav", input.clone()));
    let response = server.post_form("/infer-audio/", form).await;

    assert_wav_attachment(&response);
    assert_eq!(response.bytes().await.unwrap().to_vec(), input);
    assert_eq!(server.toolkit.calls(), vec!["infer"]);

    let mut names: Vec<String> = server
        .session_files()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    names.sort_by_key(|n| n.ends_with("_processed.wav"));
    assert_eq!(names.len(), 2);
    assert!(names[1].ends_with("_processed.wav"));
}

#[tokio::test]
async fn test_train_model_runs_toolkit_in_order() {
    let server = TestServer::start().await;
    let response = server
        .post_form("/train-model/", training_form("voice.wav", wav_bytes(4000), "3", "crepe"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();

    assert_eq!(
        server.toolkit.calls(),
        vec!["split", "resample", "generate_config", "extract_features", "train"]
    );
    assert_eq!(body["message"], "Audio processing completed successfully!");

    let model_id = body["model_id_for_infer"].as_str().unwrap();
    assert!(model_id.starts_with("alice_3_"), "{}", model_id);
    assert_eq!(model_id.len(), "alice_3_".len() + 8);
    let model_path = body["model_path"].as_str().unwrap();
    assert!(model_path.ends_with(&format!("trainmodel/{}/logs/44k/G_3.pth", model_id)), "{}", model_path);
    assert!(Path::new(model_path).is_absolute());
    assert!(body["config_path"].as_str().unwrap().ends_with("configs/44k/config.json"));

    let layout = ModelLayout::new(&server.storage(), model_id).unwrap();
    assert!(layout.upload_dir().join("voice.wav").is_file());
    assert!(layout.speaker_dir("alice").join("voice.wav").is_file());

    let config: Value = serde_json::from_str(&fs::read_to_string(layout.config_path()).unwrap()).unwrap();
    assert_eq!(config["train"]["epochs"], 3);
    assert_eq!(config["train"]["batch_size"], 4);
    assert_eq!(config["train"]["seed"], 1234);

    let record: Value = serde_json::from_str(&fs::read_to_string(layout.metadata_path()).unwrap()).unwrap();
    assert_eq!(record["model_id"], model_id);
    assert_eq!(record["user_id"], "user-1");
    assert_eq!(record["f0_method"], "crepe");
    assert_eq!(record["model_path"], format!("trainmodel/{}/logs/44k/G_3.pth", model_id));

    // обученную модель сразу можно использовать
    let form = Form::new()
        .text("model_id", model_id.to_string())
        .part("file", file_part("take.wav", wav_bytes(800)));
    assert_wav_attachment(&server.post_form("/infer-audio/", form).await);
}

#[tokio::test]
async fn test_train_model_file_zip_extracts_dataset() {
    let server = TestServer::start().await;
    let response = server
        .post_form("/train-model-file-zip/", training_form("dataset.zip", dataset_zip(), "2", "dio"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();

    assert_eq!(
        server.toolkit.calls(),
        vec!["resample", "generate_config", "extract_features", "train"]
    );
    let layout = ModelLayout::new(&server.storage(), body["model_id_for_infer"].as_str().unwrap()).unwrap();
    assert!(layout.dataset_raw().join("alice/002.wav").is_file());
    assert!(layout.dataset_dir().join("alice/001.wav").is_file());
    assert!(body["model_path"].as_str().unwrap().ends_with("logs/44k/G_2.pth"));
}

#[tokio::test]
async fn test_train_model_file_zip_splits_plain_recordings() {
    let server = TestServer::start().await;
    let response = server
        .post_form("/train-model-file-zip/", training_form("voice.wav", wav_bytes(4000), "1", "harvest"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(server.toolkit.calls()[0], "split");
}

#[tokio::test]
async fn test_train_model_file_zip_without_audio() {
    let server = TestServer::start().await;
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut cursor);
        zip.start_file("__MACOSX/._001.wav", SimpleFileOptions::default()).unwrap();
        zip.write_all(b"junk").unwrap();
        zip.finish().unwrap();
    }

    let response = server
        .post_form("/train-model-file-zip/", training_form("empty.zip", cursor.into_inner(), "2", "dio"))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(detail(response).await, "The upload contains no audio to train on");
    assert!(server.toolkit.calls().is_empty());
}

#[tokio::test]
async fn test_train_model_rejects_bad_fields() {
    let server = TestServer::start().await;
    for (epochs, f0_method) in [("zero", "dio"), ("0", "dio"), ("10", "pm")] {
        let response = server
            .post_form("/train-model/", training_form("voice.wav", wav_bytes(800), epochs, f0_method))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{} {}", epochs, f0_method);
    }

    let form = Form::new().text("name", "alice").part("file", file_part("voice.wav", wav_bytes(800)));
    let response = server.post_form("/train-model/", form).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(detail(response).await, "Field 'epochs_number' is required");

    assert!(server.toolkit.calls().is_empty());
    assert_eq!(fs::read_dir(server.storage().train_model_dir()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_train_failure_is_server_error() {
    let server = TestServer::start_with(FakeToolkit {
        fail_train: true,
        ..FakeToolkit::default()
    })
    .await;
    let response = server
        .post_form("/train-model/", training_form("voice.wav", wav_bytes(800), "5", "dio"))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(detail(response).await.contains("svc train failed"));
}

#[tokio::test]
async fn test_training_survives_client_timeout() {
    let server = TestServer::start_with(FakeToolkit {
        train_delay: Some(Duration::from_millis(1200)),
        ..FakeToolkit::default()
    })
    .await;
    let impatient = reqwest::Client::builder()
        .timeout(Duration::from_millis(400))
        .build()
        .unwrap();

    let result = impatient
        .post(server.url("/train-model/"))
        .multipart(training_form("voice.wav", wav_bytes(4000), "3", "dio"))
        .send()
        .await;
    assert!(result.unwrap_err().is_timeout());

    // клиент ушёл, а модель всё равно должна дообучиться
    let storage = server.storage();
    let mut trained = None;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let models = crate::services::catalog::list_models(&storage).unwrap();
        if let Some(model) = models.into_iter().find(|m| m.record.is_some()) {
            trained = Some(model);
            break;
        }
    }

    let model = trained.expect("training should finish after the client left");
    assert_eq!(model.latest_epoch, Some(3));
    let layout = ModelLayout::new(&storage, &model.model_id).unwrap();
    assert!(layout.log_dir().join("G_3.pth").is_file());
    assert_eq!(
        server.toolkit.calls(),
        vec!["split", "resample", "generate_config", "extract_features", "train"]
    );
}

#[tokio::test]
async fn test_text_to_speech_and_infer() {
    let server = TestServer::start().await;
    server.seed_model("alice_10_00000001", 10);

    let response = server
        .client
        .post(server.url("/text-to-speech-and-infer/"))
        .json(&serde_json::json!({"text": "hello there", "model_id": "alice_10_00000001"}))
        .send()
        .await
        .unwrap();

    assert_wav_attachment(&response);
    assert_eq!(server.toolkit.calls(), vec!["infer"]);
    assert_eq!(
        server.tts.requests.lock().unwrap().as_slice(),
        &[("hello there".to_string(), "en".to_string())]
    );

    // неизвестная модель отклоняется до синтеза
    let response = server
        .client
        .post(server.url("/text-to-speech-and-infer/"))
        .json(&serde_json::json!({"text": "hello", "model_id": "ghost_1_00000000"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(server.tts.requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_text_file_to_speech_and_infer() {
    let server = TestServer::start().await;
    server.seed_model("alice_10_00000001", 10);

    let form = Form::new()
        .text("locate", "vi")
        .text("model_id", "alice_10_00000001")
        .part("file", file_part("story.txt", "Ngày xửa ngày xưa".as_bytes().to_vec()));
    let response = server.post_form("/text-file-to-speech-and-infer/", form).await;

    assert_wav_attachment(&response);
    assert_eq!(server.toolkit.calls(), vec!["infer"]);
    assert_eq!(server.tts.requests.lock().unwrap()[0].0, "Ngày xửa ngày xưa");
}

#[tokio::test]
async fn test_model_listing_cleanup_and_delete() {
    let server = TestServer::start().await;
    let response = server
        .post_form("/train-model/", training_form("voice.wav", wav_bytes(4000), "4", "dio"))
        .await;
    let body: Value = response.json().await.unwrap();
    let model_id = body["model_id_for_infer"].as_str().unwrap().to_string();
    let layout = ModelLayout::new(&server.storage(), &model_id).unwrap();

    let models: Value = server.client.get(server.url("/models")).send().await.unwrap().json().await.unwrap();
    assert_eq!(models.as_array().unwrap().len(), 1);
    assert_eq!(models[0]["model_id"], model_id.as_str());
    assert_eq!(models[0]["latest_epoch"], 4);
    assert_eq!(models[0]["record"]["name"], "alice");

    let response = server
        .client
        .delete(server.url(&format!("/models/{}/cleanup", model_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!layout.dataset_raw().exists());
    assert!(!layout.upload_dir().exists());
    assert!(layout.log_dir().join("G_4.pth").is_file());

    let response = server
        .client
        .delete(server.url(&format!("/models/{}", model_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!layout.root().exists());

    let response = server
        .client
        .delete(server.url(&format!("/models/{}", model_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(detail(response).await.contains(&model_id));
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::start().await;
    let body: Value = server.client.get(server.url("/health")).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["workers"]["size"], 2);
    assert_eq!(body["workers"]["available"], 2);
    assert!(body["tools"].is_array());
}
