//! # Mock Framework
//!
//! Utilities for testing components in isolation.
//!
//! Use [`create_mock_board_client`] to get a board client and the receiver
//! its requests land on, then [`expect_patch_status`] or
//! [`expect_replace_all`] to assert what was sent and answer it by hand.
//! The remaining types are scripted stand-ins for the injected seams.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::app_system::NotifyError;
use crate::clients::BoardClient;
use crate::coordinator::Confirmer;
use crate::domain::{Order, OrderStatus};
use crate::feed::FeedHandlers;
use crate::messages::{BoardRequest, BoardResponse};
use crate::notify::{MemoryStore, NotificationRecord, NotificationStore, SoundPlayer};

/// Creates a board client whose requests arrive on the returned receiver
/// instead of a running board actor.
pub fn create_mock_board_client(buffer_size: usize) -> (BoardClient, mpsc::Receiver<BoardRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (BoardClient::new(sender), receiver)
}

/// Helper to verify that the next message is a PatchStatus request
pub async fn expect_patch_status(
    receiver: &mut mpsc::Receiver<BoardRequest>,
) -> Option<(String, OrderStatus, BoardResponse<Option<OrderStatus>>)> {
    match receiver.recv().await {
        Some(BoardRequest::PatchStatus {
            order_id,
            status,
            respond_to,
        }) => Some((order_id, status, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a GetOrder request
pub async fn expect_get_order(
    receiver: &mut mpsc::Receiver<BoardRequest>,
) -> Option<(String, BoardResponse<Option<Order>>)> {
    match receiver.recv().await {
        Some(BoardRequest::GetOrder {
            order_id,
            respond_to,
        }) => Some((order_id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a ReplaceAll request
pub async fn expect_replace_all(
    receiver: &mut mpsc::Receiver<BoardRequest>,
) -> Option<(Vec<Order>, BoardResponse<usize>)> {
    match receiver.recv().await {
        Some(BoardRequest::ReplaceAll { orders, respond_to }) => Some((orders, respond_to)),
        _ => None,
    }
}

/// Polls `condition` until it holds. Panics after two seconds.
pub async fn wait_until(condition: impl Fn() -> bool) {
    let polled = tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(polled.is_ok(), "condition not met within 2s");
}

/// Answers confirmation prompts from a script; runs out to `false`.
pub struct ScriptedConfirmer {
    answers: Mutex<Vec<bool>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedConfirmer {
    pub fn new(answers: Vec<bool>) -> Self {
        let mut answers = answers;
        answers.reverse();
        Self {
            answers: Mutex::new(answers),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Confirmer for ScriptedConfirmer {
    async fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answers.lock().unwrap().pop().unwrap_or(false)
    }
}

#[derive(Default)]
pub struct RecordingSound {
    plays: AtomicUsize,
}

impl RecordingSound {
    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SoundPlayer for RecordingSound {
    async fn play(&self) -> Result<(), NotifyError> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Sound device that refuses to play, like a browser blocking autoplay.
#[derive(Default)]
pub struct FailingSound {
    attempts: AtomicUsize,
}

impl FailingSound {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SoundPlayer for FailingSound {
    async fn play(&self) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(NotifyError::Sound("autoplay blocked".to_string()))
    }
}

#[derive(Default)]
pub struct RecordingHandlers {
    inserted: Mutex<Vec<String>>,
    updates: AtomicUsize,
}

impl RecordingHandlers {
    pub fn inserted(&self) -> Vec<String> {
        self.inserted.lock().unwrap().clone()
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

impl FeedHandlers for RecordingHandlers {
    fn on_insert(&self, order: Order) {
        self.inserted.lock().unwrap().push(order.id);
    }

    fn on_update(&self) {
        self.updates.fetch_add(1, Ordering::SeqCst);
    }
}

/// History store whose writes block the calling thread, like a slow disk.
pub struct SlowStore {
    inner: MemoryStore,
    delay: Duration,
    saves: AtomicUsize,
}

impl SlowStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MemoryStore::default(),
            delay,
            saves: AtomicUsize::new(0),
        }
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl NotificationStore for SlowStore {
    fn load(&self, tenant_id: &str) -> Result<Vec<NotificationRecord>, NotifyError> {
        self.inner.load(tenant_id)
    }

    fn save(&self, tenant_id: &str, records: &[NotificationRecord]) -> Result<(), NotifyError> {
        std::thread::sleep(self.delay);
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(tenant_id, records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_board_client() {
        let (client, mut receiver) = create_mock_board_client(10);

        let task = tokio::spawn(async move {
            client
                .replace_all(vec![Order::new("o1", 1, "Ana", OrderStatus::Pending)])
                .await
        });

        let (orders, responder) = expect_replace_all(&mut receiver)
            .await
            .expect("Expected ReplaceAll request");
        assert_eq!(orders.len(), 1);
        responder.send(Ok(1)).unwrap();

        assert_eq!(task.await.unwrap(), Ok(1));
    }

    #[tokio::test]
    async fn test_scripted_confirmer_runs_out_to_no() {
        let confirmer = ScriptedConfirmer::new(vec![true]);
        assert!(confirmer.confirm("first").await);
        assert!(!confirmer.confirm("second").await);
        assert_eq!(confirmer.prompts(), vec!["first", "second"]);
    }
}
