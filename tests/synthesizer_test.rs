//! End-to-end synthesizer tests against a mock provider server

use base64::{engine::general_purpose, Engine as _};
use serde_json::json;
use std::fs;
use std::path::Path;
use voxscript::config::{ProviderKind, TtsConfig};
use voxscript::error::SpeechError;
use voxscript::script::RawEntry;
use voxscript::synthesizer::NarrationSynthesizer;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FAKE_AUDIO: &[u8] = b"ID3-fake-mp3-payload";

fn speechify_config(server_uri: &str, output_dir: &Path) -> TtsConfig {
    let mut config = TtsConfig::default();
    config.preferred_provider = ProviderKind::Speechify;
    config.output_dir = output_dir.to_path_buf();
    config.speechify.endpoint = server_uri.to_string();
    config.speechify.api_key = Some("sp-test-key".to_string());
    config.elevenlabs.api_key = None;
    config
}

fn elevenlabs_config(server_uri: &str, output_dir: &Path) -> TtsConfig {
    let mut config = TtsConfig::default();
    config.preferred_provider = ProviderKind::ElevenLabs;
    config.output_dir = output_dir.to_path_buf();
    config.elevenlabs.endpoint = server_uri.to_string();
    config.elevenlabs.api_key = Some("el-test-key".to_string());
    config.speechify.api_key = None;
    config
}

fn sample_script() -> Vec<RawEntry> {
    vec![
        RawEntry::new("narrator", "The sun rises over the quiet village."),
        RawEntry::new("character", "Hello, world! This is a test."),
    ]
}

#[tokio::test]
async fn speechify_synthesis_happy_path() {
    let server = MockServer::start().await;
    let output = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/v1/audio/speech"))
        .and(header("authorization", "Bearer sp-test-key"))
        .and(body_string_contains("simba-english"))
        .and(body_string_contains("scott"))
        .and(body_string_contains(
            "The sun rises over the quiet village. ... Hello, world! This is a test.",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "audio_data": general_purpose::STANDARD.encode(FAKE_AUDIO),
            "audio_format": "mp3",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let synth = NarrationSynthesizer::new(speechify_config(&server.uri(), output.path())).unwrap();
    let result = synth.synthesize_script(&sample_script(), "en").await.unwrap();

    assert_eq!(&result.audio[..], FAKE_AUDIO);
    assert_eq!(fs::read(&result.audio_path).unwrap(), FAKE_AUDIO);

    let file_name = result.audio_path.file_name().unwrap().to_str().unwrap();
    assert!(file_name.starts_with("speechify_"), "file name: {}", file_name);
    assert!(file_name.ends_with(".mp3"));

    let transcript_path = result.transcript_path.expect("sidecar should be written");
    let transcript_name = transcript_path.file_name().unwrap().to_str().unwrap();
    assert_eq!(
        transcript_name,
        file_name.replace(".mp3", "_transcript.txt")
    );

    let transcript = fs::read_to_string(&transcript_path).unwrap();
    assert!(transcript.contains("Provider: speechify"));
    assert!(transcript.contains("Language: en"));
    assert!(transcript.contains("Speech Rate: 150 WPM"));
    assert!(transcript
        .contains("The sun rises over the quiet village. ... Hello, world! This is a test."));
    assert!(transcript.contains("1. [NARRATOR]: The sun rises over the quiet village."));
    assert!(transcript.contains("2. [CHARACTER]: Hello, world! This is a test."));
}

#[tokio::test]
async fn speechify_uses_multilingual_model_for_regional_codes() {
    let server = MockServer::start().await;
    let output = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/v1/audio/speech"))
        .and(body_string_contains("simba-multilingual"))
        .and(body_string_contains("\"language\":\"fr-FR\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "audio_data": general_purpose::STANDARD.encode(FAKE_AUDIO),
        })))
        .expect(1)
        .mount(&server)
        .await;

    let synth = NarrationSynthesizer::new(speechify_config(&server.uri(), output.path())).unwrap();
    synth.synthesize_script(&sample_script(), "fr-FR").await.unwrap();
}

#[tokio::test]
async fn unsupported_language_falls_back_to_english() {
    let server = MockServer::start().await;
    let output = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/v1/audio/speech"))
        .and(body_string_contains("simba-english"))
        .and(body_string_contains("\"language\":\"en\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "audio_data": general_purpose::STANDARD.encode(FAKE_AUDIO),
        })))
        .expect(1)
        .mount(&server)
        .await;

    let synth = NarrationSynthesizer::new(speechify_config(&server.uri(), output.path())).unwrap();
    synth.synthesize_script(&sample_script(), "xx-ZZ").await.unwrap();
}

#[tokio::test]
async fn elevenlabs_synthesis_happy_path() {
    let server = MockServer::start().await;
    let output = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/v1/text-to-speech/pNInz6obpgDQGcFmaJgB"))
        .and(query_param("optimize_streaming_latency", "0"))
        .and(query_param("output_format", "mp3_22050_32"))
        .and(header("xi-api-key", "el-test-key"))
        .and(body_string_contains("eleven_turbo_v2"))
        .and(body_string_contains("similarity_boost"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(FAKE_AUDIO.to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let synth = NarrationSynthesizer::new(elevenlabs_config(&server.uri(), output.path())).unwrap();
    let result = synth.synthesize_script(&sample_script(), "en").await.unwrap();

    assert_eq!(&result.audio[..], FAKE_AUDIO);
    let file_name = result.audio_path.file_name().unwrap().to_str().unwrap();
    assert!(file_name.starts_with("elevenlabs_"));

    let transcript = fs::read_to_string(result.transcript_path.unwrap()).unwrap();
    assert!(transcript.contains("Provider: elevenlabs"));
}

#[tokio::test]
async fn elevenlabs_uses_multilingual_model_for_regional_codes() {
    let server = MockServer::start().await;
    let output = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/v1/text-to-speech/pNInz6obpgDQGcFmaJgB"))
        .and(body_string_contains("eleven_multilingual_v2"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(FAKE_AUDIO.to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let synth = NarrationSynthesizer::new(elevenlabs_config(&server.uri(), output.path())).unwrap();
    synth.synthesize_script(&sample_script(), "de-DE").await.unwrap();
}

#[tokio::test]
async fn free_text_synthesis_combines_parsed_lines() {
    let server = MockServer::start().await;
    let output = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/v1/audio/speech"))
        .and(body_string_contains("Intro ... Let's go!"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "audio_data": general_purpose::STANDARD.encode(FAKE_AUDIO),
        })))
        .expect(1)
        .mount(&server)
        .await;

    let synth = NarrationSynthesizer::new(speechify_config(&server.uri(), output.path())).unwrap();
    let result = synth
        .synthesize_text("[Intro]\nHero: Let's go!", "en")
        .await
        .unwrap();

    let transcript = fs::read_to_string(result.transcript_path.unwrap()).unwrap();
    assert!(transcript.contains("1. [NARRATOR]: Intro"));
    assert!(transcript.contains("2. [CHARACTER] Hero: Let's go!"));
}

#[tokio::test]
async fn provider_failure_surfaces_as_synthesis_error() {
    let server = MockServer::start().await;
    let parent = tempfile::tempdir().unwrap();
    let output = parent.path().join("audio");

    Mock::given(method("POST"))
        .and(path("/v1/audio/speech"))
        .respond_with(ResponseTemplate::new(500).set_body_string("quota exceeded"))
        .expect(1)
        .mount(&server)
        .await;

    let synth = NarrationSynthesizer::new(speechify_config(&server.uri(), &output)).unwrap();
    match synth.synthesize_script(&sample_script(), "en").await {
        Err(SpeechError::Synthesis(msg)) => {
            assert!(msg.contains("quota exceeded"), "message was: {}", msg);
        }
        _ => panic!("Expected Synthesis error"),
    }

    // Nothing written on failure; the output directory was never created
    assert!(!output.exists());
}

#[tokio::test]
async fn malformed_base64_is_a_synthesis_error() {
    let server = MockServer::start().await;
    let output = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/v1/audio/speech"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "audio_data": "!!! not base64 !!!",
        })))
        .mount(&server)
        .await;

    let synth = NarrationSynthesizer::new(speechify_config(&server.uri(), output.path())).unwrap();
    assert!(matches!(
        synth.synthesize_script(&sample_script(), "en").await,
        Err(SpeechError::Synthesis(_))
    ));
}

#[tokio::test]
async fn empty_script_is_rejected_before_any_network_call() {
    let server = MockServer::start().await;
    let output = tempfile::tempdir().unwrap();

    // No mock mounted: a request would 404 and fail the test via the error path
    let synth = NarrationSynthesizer::new(speechify_config(&server.uri(), output.path())).unwrap();

    let whitespace_only = vec![RawEntry::new("narrator", "  ")];
    assert!(matches!(
        synth.synthesize_script(&whitespace_only, "en").await,
        Err(SpeechError::EmptyInput(_))
    ));

    assert!(matches!(
        synth.synthesize_script(&[], "en").await,
        Err(SpeechError::EmptyInput(_))
    ));

    // Bracket markup with an empty interior parses to an empty combined text
    assert!(matches!(
        synth.synthesize_text("[]", "en").await,
        Err(SpeechError::EmptyInput(_))
    ));
}

#[tokio::test]
async fn speechify_voice_listing() {
    let server = MockServer::start().await;
    let output = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/v1/voices"))
        .and(header("authorization", "Bearer sp-test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "george",
                "display_name": "George",
                "gender": "male",
                "tags": ["timbre:deep"],
                "models": [
                    {"name": "simba-english", "languages": [{"locale": "en-US"}]}
                ]
            }
        ])))
        .mount(&server)
        .await;

    let synth = NarrationSynthesizer::new(speechify_config(&server.uri(), output.path())).unwrap();
    let voices = synth.available_voices().await;
    assert_eq!(voices.len(), 1);
    assert_eq!(voices[0].id, "george");
    assert_eq!(voices[0].models[0].name, "simba-english");
    assert_eq!(voices[0].models[0].languages[0].locale, "en-US");
}

#[tokio::test]
async fn elevenlabs_voice_listing_maps_labels() {
    let server = MockServer::start().await;
    let output = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/v1/voices"))
        .and(header("xi-api-key", "el-test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "voices": [
                {
                    "voice_id": "v1",
                    "name": "Adam",
                    "labels": {"gender": "male", "accent": "american"},
                    "high_quality_base_model_ids": ["eleven_turbo_v2", "eleven_multilingual_v2"]
                }
            ]
        })))
        .mount(&server)
        .await;

    let synth = NarrationSynthesizer::new(elevenlabs_config(&server.uri(), output.path())).unwrap();
    let voices = synth.available_voices().await;
    assert_eq!(voices.len(), 1);
    assert_eq!(voices[0].id, "v1");
    assert_eq!(voices[0].display_name, "Adam");
    assert_eq!(voices[0].gender, "male");
    assert!(voices[0].tags.contains(&"accent:american".to_string()));
    assert!(voices[0].tags.contains(&"gender:male".to_string()));
    assert_eq!(voices[0].models.len(), 2);
}

#[tokio::test]
async fn voice_listing_degrades_to_empty_on_failure() {
    let server = MockServer::start().await;
    let output = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/v1/voices"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let synth = NarrationSynthesizer::new(speechify_config(&server.uri(), output.path())).unwrap();
    assert!(synth.available_voices().await.is_empty());
}

#[test]
fn cleanup_with_zero_threshold_removes_all_files() {
    let output = tempfile::tempdir().unwrap();
    fs::write(output.path().join("old_a.mp3"), b"a").unwrap();
    fs::write(output.path().join("old_b_transcript.txt"), b"b").unwrap();
    fs::create_dir(output.path().join("keep_dir")).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(20));

    let synth =
        NarrationSynthesizer::new(speechify_config("http://127.0.0.1:1", output.path())).unwrap();
    let removed = synth.cleanup_stale_files(0);
    assert_eq!(removed, 2);

    // Directories are never touched
    assert!(output.path().join("keep_dir").exists());
    assert!(!output.path().join("old_a.mp3").exists());
}

#[test]
fn cleanup_keeps_files_younger_than_threshold() {
    let output = tempfile::tempdir().unwrap();
    fs::write(output.path().join("fresh.mp3"), b"a").unwrap();

    let synth =
        NarrationSynthesizer::new(speechify_config("http://127.0.0.1:1", output.path())).unwrap();
    assert_eq!(synth.cleanup_stale_files(24), 0);
    assert!(output.path().join("fresh.mp3").exists());
}

#[test]
fn cleanup_on_missing_directory_is_a_noop() {
    let parent = tempfile::tempdir().unwrap();
    let missing = parent.path().join("never_created");

    let synth =
        NarrationSynthesizer::new(speechify_config("http://127.0.0.1:1", &missing)).unwrap();
    assert_eq!(synth.cleanup_stale_files(0), 0);
    assert!(!missing.exists());
}

#[test]
fn audio_info_reports_size_or_absence() {
    let output = tempfile::tempdir().unwrap();
    let file = output.path().join("clip.mp3");
    fs::write(&file, vec![0u8; 2048]).unwrap();

    let synth =
        NarrationSynthesizer::new(speechify_config("http://127.0.0.1:1", output.path())).unwrap();

    let info = synth.audio_info(&file);
    assert!(info.exists);
    assert_eq!(info.file_size_bytes, 2048);

    let info = synth.audio_info(&output.path().join("missing.mp3"));
    assert!(!info.exists);
    assert_eq!(info.file_size_bytes, 0);
}
