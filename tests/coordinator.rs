//! End-to-end tutoring sessions with scripted agents.

mod common;

use common::*;
use learnie::completion::CompletionReply;
use learnie::coordinator::{SessionState, TutorCoordinator, TutorReply};
use learnie::image_search::BraveImageSearch;
use learnie::schema::{LearningStyle, MaterialSize, QuizAnswer, SubtopicId};
use learnie::tutor::TopicPreferences;
use learnie::LearnieError;
use std::sync::Arc;

const REQUEST: &str = "I want to learn basic statistics";

fn topic_replies() -> Vec<CompletionReply> {
    vec![
        lookups(3),
        CompletionReply::text(topic_json([&image_url(1), &image_url(2), &image_url(3)])),
    ]
}

fn material_replies() -> Vec<CompletionReply> {
    vec![
        lookups(3),
        CompletionReply::text(material_json([&image_url(4), &image_url(5), &image_url(6)])),
    ]
}

async fn session_with_topic() -> (TutorCoordinator, Arc<ScriptedCompletion>) {
    let completion = ScriptedCompletion::new(topic_replies());
    let mut tutor = TutorCoordinator::new(factory(completion.clone(), StaticImageSearch::new()));
    let reply = tutor.handle(&format!("/topic {}", REQUEST)).await.unwrap();
    assert!(matches!(reply, TutorReply::TopicCreated { .. }));
    (tutor, completion)
}

#[tokio::test]
async fn test_topic_then_material_then_score() {
    let (mut tutor, completion) = session_with_topic().await;
    assert_eq!(tutor.state(), SessionState::TopicReady);
    assert_eq!(tutor.topic().unwrap().title, REQUEST);

    completion.push(material_replies());
    let reply = tutor.handle("/material Mean and Median").await.unwrap();
    let id = SubtopicId::new(1, 1);
    match reply {
        TutorReply::Material { subtopic, article } => {
            assert_eq!(subtopic, id);
            assert_eq!(article.material.len(), 3);
            assert!(article
                .material
                .iter()
                .all(|b| b.image_url.starts_with("https://img.test/")));
        }
        other => panic!("unexpected reply: {:?}", other),
    }
    assert_eq!(tutor.state(), SessionState::MaterialReady(id));
    assert_eq!(tutor.report_progress(id).unwrap(), 30);

    assert_eq!(tutor.record_game_score(id, 80).unwrap(), 80);
    assert_eq!(tutor.report_progress(id).unwrap(), 86);
    assert_eq!(tutor.state(), SessionState::ScoreReported(id));
}

#[tokio::test]
async fn test_quiz_answers_feed_progress() {
    let (mut tutor, completion) = session_with_topic().await;
    completion.push(vec![CompletionReply::text(choice_quiz_json())]);

    let reply = tutor.handle("/quiz 1.1").await.unwrap();
    let id = SubtopicId::new(1, 1);
    assert!(matches!(reply, TutorReply::Quiz { subtopic, .. } if subtopic == id));
    assert_eq!(tutor.state(), SessionState::PracticeRequested(id));

    let result = tutor
        .record_quiz_answers(
            id,
            &[
                QuizAnswer::Choice(0),
                QuizAnswer::Choice(1),
                QuizAnswer::Choice(0),
            ],
        )
        .unwrap();
    assert_eq!(result.correct, 2);
    assert_eq!(result.score, 67);
    assert!(!result.passed);

    // No material viewed: only the practice share counts.
    assert_eq!(tutor.report_progress(id).unwrap(), 47);
}

#[tokio::test]
async fn test_quiz_without_material_uses_brief() {
    let (mut tutor, completion) = session_with_topic().await;
    completion.push(vec![CompletionReply::text(choice_quiz_json())]);

    tutor.handle("/quiz 1.1 choice").await.unwrap();
    let task = completion
        .requests()
        .last()
        .and_then(|r| r.last_user_message().map(str::to_string))
        .unwrap();
    assert!(task.contains("Two ways to describe the center of a dataset."));
}

#[tokio::test]
async fn test_free_form_message_is_classified() {
    let (mut tutor, completion) = session_with_topic().await;
    let before = completion.calls();
    completion.push(vec![CompletionReply::text(
        r#"{"intent": "fetch_material", "subtopic": "1.2"}"#,
    )]);
    completion.push(material_replies());

    let reply = tutor
        .handle("Can you teach me about spread and variance?")
        .await
        .unwrap();
    assert!(matches!(reply, TutorReply::Material { subtopic, .. } if subtopic == SubtopicId::new(1, 2)));
    assert_eq!(completion.calls(), before + 3);

    let classifier_request = &completion.requests()[before];
    assert!(classifier_request.tools.is_empty());
    assert_eq!(classifier_request.temperature, Some(0.0));
}

#[tokio::test]
async fn test_unrecognized_message_gets_help_without_content_agents() {
    let (mut tutor, completion) = session_with_topic().await;
    let before = completion.calls();

    let reply = tutor.handle("/dance").await.unwrap();
    assert!(matches!(reply, TutorReply::Message { .. }));
    assert_eq!(completion.calls(), before);

    completion.push(vec![CompletionReply::text("I am not sure what you mean.")]);
    let reply = tutor.handle("purple elephants?").await.unwrap();
    assert!(matches!(reply, TutorReply::Message { .. }));
    assert_eq!(completion.calls(), before + 1);
    assert_eq!(tutor.state(), SessionState::TopicReady);
}

#[tokio::test]
async fn test_material_before_topic_is_refused() {
    let completion = ScriptedCompletion::new(vec![]);
    let mut tutor = TutorCoordinator::new(factory(completion.clone(), StaticImageSearch::new()));

    let reply = tutor.handle("/material 1.1").await.unwrap();
    match reply {
        TutorReply::Message { text } => assert!(text.contains("no learning plan")),
        other => panic!("unexpected reply: {:?}", other),
    }
    assert_eq!(completion.calls(), 0);
    assert_eq!(tutor.state(), SessionState::AwaitingTopic);
}

#[tokio::test]
async fn test_unknown_subtopic_is_reported() {
    let (mut tutor, completion) = session_with_topic().await;
    let before = completion.calls();

    let reply = tutor.handle("/material 9.9").await.unwrap();
    match reply {
        TutorReply::Message { text } => assert!(text.contains("9.9")),
        other => panic!("unexpected reply: {:?}", other),
    }
    assert_eq!(completion.calls(), before);
    assert!(matches!(
        tutor.record_game_score(SubtopicId::new(4, 1), 50),
        Err(LearnieError::SubtopicNotFound(_))
    ));
}

#[tokio::test]
async fn test_failed_generation_asks_to_try_again() {
    let completion = ScriptedCompletion::new(vec![
        CompletionReply::text("plan coming up"),
        CompletionReply::text("```json\n{}\n```"),
        CompletionReply::text("{}"),
    ]);
    let mut tutor = TutorCoordinator::new(factory(completion.clone(), StaticImageSearch::new()));

    let reply = tutor.handle(&format!("/topic {}", REQUEST)).await.unwrap();
    match reply {
        TutorReply::TryAgain { text } => assert!(text.contains("topic")),
        other => panic!("unexpected reply: {:?}", other),
    }
    assert_eq!(completion.calls(), 3);
    assert!(tutor.topic().is_none());
}

#[tokio::test]
async fn test_failed_material_keeps_previous_state() {
    let (mut tutor, completion) = session_with_topic().await;
    completion.push(vec![
        CompletionReply::text("nope"),
        CompletionReply::text("nope"),
        CompletionReply::text("nope"),
    ]);

    let reply = tutor.handle("/material 1.1").await.unwrap();
    assert!(matches!(reply, TutorReply::TryAgain { .. }));
    assert_eq!(tutor.state(), SessionState::TopicReady);
    assert!(tutor.material(SubtopicId::new(1, 1)).is_none());
    assert_eq!(tutor.report_progress(SubtopicId::new(1, 1)).unwrap(), 0);
}

#[tokio::test]
async fn test_failed_quiz_keeps_material_state() {
    let (mut tutor, completion) = session_with_topic().await;
    completion.push(material_replies());
    tutor.handle("/material 1.1").await.unwrap();
    let ready = SessionState::MaterialReady(SubtopicId::new(1, 1));
    assert_eq!(tutor.state(), ready);

    completion.push(vec![
        CompletionReply::text("Here is your quiz!"),
        CompletionReply::text("Here is your quiz!"),
        CompletionReply::text("Here is your quiz!"),
    ]);
    let reply = tutor.handle("/quiz 1.2").await.unwrap();
    assert!(matches!(reply, TutorReply::TryAgain { .. }));
    assert_eq!(tutor.state(), ready);
    assert!(tutor.quiz(SubtopicId::new(1, 2)).is_none());
}

#[tokio::test]
async fn test_missing_image_key_surfaces_as_error() {
    let completion = ScriptedCompletion::new(topic_replies());
    let mut tutor = TutorCoordinator::new(factory(
        completion.clone(),
        Arc::new(BraveImageSearch::new(None)),
    ));

    let err = tutor.handle(&format!("/topic {}", REQUEST)).await.unwrap_err();
    assert!(matches!(err, LearnieError::Config(_)));
}

#[tokio::test]
async fn test_new_topic_resets_progress() {
    let (mut tutor, completion) = session_with_topic().await;
    let id = SubtopicId::new(1, 1);
    tutor.record_game_score(id, 100).unwrap();
    assert_eq!(tutor.report_progress(id).unwrap(), 70);

    completion.push(vec![
        lookups(3),
        CompletionReply::text(topic_json([&image_url(4), &image_url(5), &image_url(6)])),
    ]);
    tutor
        .handle("/topic I want to learn probability")
        .await
        .unwrap();
    assert_eq!(tutor.topic().unwrap().title, "I want to learn probability");
    assert_eq!(tutor.report_progress(id).unwrap(), 0);
}

#[tokio::test]
async fn test_game_for_subtopic() {
    let (mut tutor, completion) = session_with_topic().await;
    completion.push(vec![gameplay_ideas_call(), CompletionReply::text(game_html())]);

    let reply = tutor.handle("/game 1.1 falling words").await.unwrap();
    match reply {
        TutorReply::Game { subtopic, game } => {
            assert_eq!(subtopic, SubtopicId::new(1, 1));
            assert!(game.html().contains("LearnieScore"));
        }
        other => panic!("unexpected reply: {:?}", other),
    }

    // Out-of-range scores from the page are clamped.
    assert_eq!(tutor.record_game_score(SubtopicId::new(1, 1), 250).unwrap(), 100);
}

#[tokio::test]
async fn test_added_subtopic_keeps_existing_ids() {
    let (mut tutor, completion) = session_with_topic().await;
    tutor.record_game_score(SubtopicId::new(1, 1), 50).unwrap();
    completion.push(vec![CompletionReply::text(
        r#"{"title": "Weighted Mean", "summary": "Averages where some values count more."}"#,
    )]);

    let (id, subtopic) = tutor
        .add_subtopic("Mean and Median", Some("grades with credits"))
        .await
        .unwrap();
    assert_eq!(id, SubtopicId::new(1, 4));
    assert_eq!(subtopic.title, "Weighted Mean");

    let topic = tutor.topic().unwrap();
    assert_eq!(topic.sections[0].subtopics.len(), 4);
    assert_eq!(topic.resolve_subtopic("Weighted Mean"), Some(id));
    assert_eq!(topic.resolve_subtopic("Spread and Variance"), Some(SubtopicId::new(1, 2)));
    assert_eq!(tutor.report_progress(SubtopicId::new(1, 1)).unwrap(), 35);
    assert_eq!(tutor.state(), SessionState::TopicReady);

    completion.push(material_replies());
    let reply = tutor.handle("/material 1.4").await.unwrap();
    assert!(matches!(reply, TutorReply::Material { subtopic, .. } if subtopic == id));
}

#[tokio::test]
async fn test_failed_subtopic_leaves_plan_unchanged() {
    let (mut tutor, completion) = session_with_topic().await;
    let before = tutor.topic().unwrap().clone();
    completion.push(vec![
        CompletionReply::text("How about weighted means?"),
        CompletionReply::text("How about weighted means?"),
        CompletionReply::text("How about weighted means?"),
    ]);

    let err = tutor.add_subtopic("1.1", None).await.unwrap_err();
    assert!(matches!(err, LearnieError::GenerationFailed { .. }));
    assert_eq!(tutor.topic().unwrap(), &before);
}

#[tokio::test]
async fn test_suggestions_leave_plan_unchanged() {
    let (tutor, completion) = session_with_topic().await;
    completion.push(vec![CompletionReply::text(
        r#"[{"title": "Mode", "description": "The most common value."},
            {"title": "Weighted Mean", "description": "Some values count more."},
            {"title": "Trimmed Mean", "description": "Dropping the extremes first."}]"#,
    )]);

    let suggestions = tutor.suggest_subtopics("1.1").await.unwrap();
    assert_eq!(suggestions.len(), 3);
    assert_eq!(tutor.topic().unwrap().sections[0].subtopics.len(), 3);
}

#[tokio::test]
async fn test_topic_style_reaches_material_prompt() {
    let completion = ScriptedCompletion::new(topic_replies());
    let mut tutor = TutorCoordinator::new(factory(completion.clone(), StaticImageSearch::new()));
    let preferences = TopicPreferences {
        learning_style: Some(LearningStyle {
            material_size: MaterialSize::Large,
            ..Default::default()
        }),
        clarifications: Vec::new(),
    };
    tutor.create_topic_with(REQUEST, &preferences).await.unwrap();

    completion.push(material_replies());
    tutor.handle("/material 1.1").await.unwrap();
    let task = completion
        .requests()
        .last()
        .and_then(|r| r.last_user_message().map(str::to_string))
        .unwrap();
    assert!(task.contains("Material size: large"));
}
