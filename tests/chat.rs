//! Document chat flow tests

use summarizer_x::chat::{self, ChatAction, PROMPT_ERROR_LABEL};
use summarizer_x::completion::{DOCUMENT_SYSTEM_PROMPT, GENERAL_SYSTEM_PROMPT};
use summarizer_x::extract::extract_upload;
use summarizer_x::session::{Role, SessionState, Turn};
use summarizer_x::Error;

mod common;
use common::ScriptedCompletion;

fn with_document(text: &str) -> SessionState {
    let mut state = SessionState::new();
    state.set_document(text.to_string());
    state
}

#[tokio::test]
async fn test_summarize_uploaded_text() {
    let extracted = extract_upload("text/plain", b"The quick brown fox.")
        .unwrap()
        .unwrap();
    let state = with_document(&extracted);
    let client = ScriptedCompletion::replying("A fox, briefly.");

    let (state, outcome) = chat::run_action(state, ChatAction::Summarize, &client).await;

    assert_eq!(outcome.unwrap(), "A fox, briefly.");
    assert_eq!(
        state.history(),
        &[
            Turn::user("Summarize the uploaded content."),
            Turn::assistant("A fox, briefly."),
        ]
    );

    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0],
        vec![
            Turn::system(DOCUMENT_SYSTEM_PROMPT),
            Turn::system("Here is the document content: The quick brown fox."),
            Turn::user("Summarize the uploaded content."),
        ]
    );
}

#[tokio::test]
async fn test_history_is_sent_on_follow_up() {
    let client = ScriptedCompletion::new(vec![Ok("first".to_string()), Ok("second".to_string())]);
    let state = with_document("Doc.");

    let (state, _) = chat::run_action(state, ChatAction::Quiz, &client).await;
    let (state, outcome) = chat::send_prompt(state, "What is question one?", &client).await;

    assert_eq!(outcome.unwrap(), "second");
    assert_eq!(state.history().len(), 4);

    let last = client.requests().pop().unwrap();
    assert_eq!(last.len(), 5);
    assert_eq!(last[2], Turn::user("Generate quiz questions from the uploaded content."));
    assert_eq!(last[3], Turn::assistant("first"));
    assert_eq!(last[4], Turn::user("What is question one?"));
}

#[tokio::test]
async fn test_prompt_without_document_uses_general_prompt() {
    let client = ScriptedCompletion::replying("Paris.");

    let (state, outcome) =
        chat::send_prompt(SessionState::new(), "Capital of France?", &client).await;

    assert_eq!(outcome.unwrap(), "Paris.");
    assert_eq!(state.history().len(), 2);
    assert_eq!(
        client.requests()[0],
        vec![
            Turn::system(GENERAL_SYSTEM_PROMPT),
            Turn::user("Capital of France?"),
        ]
    );
}

#[tokio::test]
async fn test_action_without_document_is_rejected() {
    let client = ScriptedCompletion::replying("unused");

    let (state, outcome) =
        chat::run_action(SessionState::new(), ChatAction::Paraphrase, &client).await;

    let failure = outcome.unwrap_err();
    assert_eq!(failure.label, "Error generating paraphrase");
    assert!(matches!(failure.error, Error::NoDocument));
    assert!(state.history().is_empty());
    assert!(client.requests().is_empty());
}

#[tokio::test]
async fn test_failed_completion_keeps_user_turn() {
    let client = ScriptedCompletion::failing("rate limited");

    let (state, outcome) =
        chat::run_action(with_document("Doc."), ChatAction::Summarize, &client).await;

    let failure = outcome.unwrap_err();
    assert_eq!(failure.label, "Error generating summary");
    assert!(failure.to_string().starts_with("Error generating summary: "));
    assert_eq!(state.history().len(), 1);
    assert_eq!(state.history()[0].role, Role::User);
}

#[tokio::test]
async fn test_empty_prompt_is_rejected() {
    let client = ScriptedCompletion::replying("unused");

    let (state, outcome) = chat::send_prompt(SessionState::new(), "   ", &client).await;

    let failure = outcome.unwrap_err();
    assert_eq!(failure.label, PROMPT_ERROR_LABEL);
    assert!(matches!(failure.error, Error::EmptyPrompt));
    assert!(state.history().is_empty());
}
