/*!
 * Integration tests for the file processing workflow
 */

use anyhow::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use subtitletool::app_config::{Config, TranslationProvider};
use subtitletool::app_controller::{Controller, FileOutcome};
use subtitletool::database::Repository;
use subtitletool::file_utils::FileManager;
use subtitletool::providers::mock::MockTranslator;
use subtitletool::subtitle_writer::{Cue, SubtitleFormat};
use subtitletool::timing;

use crate::common;

fn translating_config() -> Config {
    common::init_test_logging();
    let mut config = Config::default();
    config.translate = true;
    config.translation.retry_backoff_ms = 1;
    config.translation.max_backoff_ms = 2;
    config
}

#[tokio::test]
async fn test_transcript_withoutTranslation_shouldWriteRepairedSrt() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let input = common::create_test_transcript(dir.path(), "talk.json")?;
    let controller = Controller::with_config(Config::default())?.without_progress();

    let outcome = controller.run(input.clone(), dir.path().to_path_buf(), false).await?;

    let output = dir.path().join("talk.eng_Latn.srt");
    assert_eq!(outcome, FileOutcome::Processed(vec![output.clone()]));

    let written = FileManager::load_segments(&output)?;
    assert_eq!(written.len(), 3);
    assert_eq!(written[0].end, 1.9);
    assert_eq!(written[2].text, "How are you?");
    assert!(timing::check_invariants(&written).is_ok());
    Ok(())
}

#[tokio::test]
async fn test_translation_shouldWriteEveryFormatAndCues() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let input = common::create_test_transcript(dir.path(), "talk.json")?;
    let mut config = translating_config();
    config.output.formats = vec![SubtitleFormat::Srt, SubtitleFormat::Vtt, SubtitleFormat::Ass];
    config.output.write_cues = true;
    let controller = Controller::with_translator(config, Arc::new(MockTranslator::tagging()))?.without_progress();

    let outcome = controller
        .run_with_cancel(&input, dir.path(), false, &CancellationToken::new())
        .await?;

    let FileOutcome::Processed(paths) = outcome else {
        panic!("expected outputs to be written");
    };
    assert_eq!(paths.len(), 4);
    assert!(paths.iter().all(|p| p.exists()));

    let srt = FileManager::load_segments(dir.path().join("talk.pes_Arab.srt"))?;
    assert_eq!(srt[1].text, "[pes_Arab] world");

    let cues: Vec<Cue> = serde_json::from_str(&FileManager::read_to_string(dir.path().join("talk.pes_Arab.cues.json"))?)?;
    assert_eq!(cues.len(), 3);
    assert!(cues.iter().all(|c| c.right_to_left));
    assert!(FileManager::read_to_string(dir.path().join("talk.pes_Arab.vtt"))?.starts_with("WEBVTT"));
    Ok(())
}

#[tokio::test]
async fn test_existingOutputs_shouldBeSkippedUnlessForced() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(dir.path(), "movie.srt")?;
    let controller = Controller::with_config(Config::default())?.without_progress();
    let cancel = CancellationToken::new();

    let first = controller.run_with_cancel(&input, dir.path(), false, &cancel).await?;
    let second = controller.run_with_cancel(&input, dir.path(), false, &cancel).await?;
    let forced = controller.run_with_cancel(&input, dir.path(), true, &cancel).await?;

    assert!(matches!(first, FileOutcome::Processed(_)));
    assert_eq!(second, FileOutcome::Skipped);
    assert!(matches!(forced, FileOutcome::Processed(_)));
    Ok(())
}

#[tokio::test]
async fn test_authFailure_shouldStillWriteOriginalText() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let input = common::create_test_transcript(dir.path(), "talk.json")?;
    let controller =
        Controller::with_translator(translating_config(), Arc::new(MockTranslator::auth_failure()))?.without_progress();

    controller
        .run_with_cancel(&input, dir.path(), false, &CancellationToken::new())
        .await?;

    let srt = FileManager::load_segments(dir.path().join("talk.pes_Arab.srt"))?;
    assert_eq!(srt[0].text, "Hello");
    Ok(())
}

#[tokio::test]
async fn test_folderRun_shouldProcessInputsAndIgnoreOutputs() -> Result<()> {
    let dir = common::create_temp_dir()?;
    common::create_test_transcript(dir.path(), "a.json")?;
    let nested = dir.path().join("nested");
    std::fs::create_dir_all(&nested)?;
    common::create_test_subtitle(&nested, "b.srt")?;
    common::create_test_file(dir.path(), "notes.txt", "not an input")?;

    let mut config = Config::default();
    config.translation.provider = TranslationProvider::Passthrough;
    let controller = Controller::with_config(config)?.without_progress();

    let first = controller.run_folder(dir.path().to_path_buf(), false).await?;
    assert_eq!(first.processed, 2);
    assert_eq!(first.errors, 0);
    assert!(nested.join("b.eng_Latn.srt").exists());

    // Generated SRT files are not picked up as new inputs
    let second = controller.run_folder(dir.path().to_path_buf(), false).await?;
    assert_eq!(second.processed, 0);
    assert_eq!(second.skipped, 2);
    Ok(())
}

#[tokio::test]
async fn test_folderRun_withNewTargetLanguage_shouldIgnoreEarlierOutputs() -> Result<()> {
    let dir = common::create_temp_dir()?;
    common::create_test_transcript(dir.path(), "talk.json")?;

    let mut persian = translating_config();
    persian.output.write_cues = true;
    let controller = Controller::with_translator(persian, Arc::new(MockTranslator::tagging()))?.without_progress();
    let first = controller.run_folder(dir.path().to_path_buf(), false).await?;
    assert_eq!(first.processed, 1);
    assert!(dir.path().join("talk.pes_Arab.cues.json").exists());

    let mut french = translating_config();
    french.target_language = "fra_Latn".to_string();
    let controller = Controller::with_translator(french, Arc::new(MockTranslator::tagging()))?.without_progress();
    let second = controller.run_folder(dir.path().to_path_buf(), false).await?;

    assert_eq!(second.processed, 1);
    assert_eq!(second.errors, 0);
    assert!(dir.path().join("talk.fra_Latn.srt").exists());
    assert!(!dir.path().join("talk.pes_Arab.fra_Latn.srt").exists());
    assert!(!dir.path().join("talk.pes_Arab.cues.fra_Latn.srt").exists());
    Ok(())
}

#[tokio::test]
async fn test_enabledDatabase_shouldStoreFinalSegments() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let input = common::create_test_transcript(dir.path(), "talk.json")?;
    let db_path = dir.path().join("subtitles.db");
    let mut config = translating_config();
    config.database.enabled = true;
    config.database.path = Some(db_path.clone());
    let controller = Controller::with_translator(config, Arc::new(MockTranslator::tagging()))?.without_progress();

    controller
        .run_with_cancel(&input, dir.path(), false, &CancellationToken::new())
        .await?;

    let found = controller.search("world", None).await?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].language, "pes_Arab");

    let repo = Repository::open(Some(&db_path))?;
    assert_eq!(repo.subtitle_count(&input.to_string_lossy()).await?, 3);
    assert_eq!(controller.stats()?.media_count, 1);
    Ok(())
}

#[tokio::test]
async fn test_processedMedia_afterTwoRuns_shouldListEachInputWithCount() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let first = common::create_test_transcript(dir.path(), "first.json")?;
    let second = common::create_test_subtitle(dir.path(), "second.srt")?;
    let mut config = Config::default();
    config.database.enabled = true;
    config.database.path = Some(dir.path().join("subtitles.db"));
    let controller = Controller::with_config(config)?.without_progress();

    assert!(controller.processed_media().await?.is_empty());
    for input in [&first, &second] {
        controller
            .run_with_cancel(input, dir.path(), false, &CancellationToken::new())
            .await?;
    }

    let listed = controller.processed_media().await?;
    assert_eq!(listed.len(), 2);
    let first_entry = listed
        .iter()
        .find(|(media, _)| media.path == first.to_string_lossy())
        .expect("first input listed");
    assert_eq!(first_entry.1, 3);
    assert!(listed.iter().all(|(_, count)| *count > 0));
    Ok(())
}

#[test]
fn test_missingInput_shouldError() {
    common::init_test_logging();
    let dir = common::create_temp_dir().unwrap();
    let controller = Controller::with_config(Config::default()).unwrap().without_progress();

    let result = tokio_test::block_on(async {
        controller
            .run_with_cancel(&dir.path().join("missing.json"), dir.path(), false, &CancellationToken::new())
            .await
    });

    assert!(result.is_err());
}
