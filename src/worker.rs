use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    mpsc, Arc,
};

use burn::prelude::Backend;
use tokio::sync::oneshot;

use crate::error::{Error, Result};
use crate::inference::{classify_data_url, Classifier};

type Callback = oneshot::Sender<Result<&'static str>>;

struct Job {
    image: String,
    callback: Callback,
}

/// Inference threads, each owning its own copy of the model.
///
/// Burn modules can be moved between threads but not shared by reference, so every
/// worker gets a clone and requests reach it through a channel. Jobs are handed out
/// round robin.
#[derive(Clone)]
pub struct InferencePool {
    senders: Arc<[mpsc::Sender<Job>]>,
    next: Arc<AtomicUsize>,
}

impl InferencePool {
    /// Spawns `workers` threads (at least one) serving `classifier`.
    pub fn start<B: Backend>(classifier: Classifier<B>, workers: usize) -> Result<Self> {
        let senders = (0..workers.max(1))
            .map(|id| Self::spawn_worker(id, classifier.clone()))
            .collect::<Result<Vec<_>>>()?;

        log::info!("Started {} inference worker(s)", senders.len());

        Ok(Self {
            senders: senders.into(),
            next: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn spawn_worker<B: Backend>(
        id: usize,
        classifier: Classifier<B>,
    ) -> Result<mpsc::Sender<Job>> {
        let (sender, receiver) = mpsc::channel::<Job>();

        std::thread::Builder::new()
            .name(format!("inference-{id}"))
            .spawn(move || {
                // Ends once every sender, i.e. the pool, is dropped.
                for job in receiver.iter() {
                    let classify = || classify_data_url(&classifier, &job.image);
                    let result = catch_unwind(AssertUnwindSafe(classify)).unwrap_or_else(|_| {
                        Err(Error::Inference("inference panicked".to_string()))
                    });
                    // The request may have been dropped by the client already.
                    let _ = job.callback.send(result);
                }
                log::debug!("Inference worker {id} stopped");
            })?;

        Ok(sender)
    }

    pub fn workers(&self) -> usize {
        self.senders.len()
    }

    /// Classifies a data URL on the next worker.
    pub async fn classify(&self, image: String) -> Result<&'static str> {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.senders.len();
        let (callback, response) = oneshot::channel();

        self.senders[index]
            .send(Job { image, callback })
            .map_err(|_| Error::Inference(format!("inference worker {index} stopped")))?;

        response.await.map_err(|_| {
            Error::Inference(format!("inference worker {index} dropped the request"))
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DigitClassifierConfig;
    use crate::TestBackend;

    fn pool(workers: usize) -> InferencePool {
        let device = Default::default();
        let model = DigitClassifierConfig::new().init::<TestBackend>(&device);
        InferencePool::start(Classifier::new(model, device), workers).unwrap()
    }

    #[test]
    fn starts_at_least_one_worker() {
        assert_eq!(pool(0).workers(), 1);
        assert_eq!(pool(3).workers(), 3);
    }

    #[tokio::test]
    async fn errors_come_back_from_the_worker() {
        let pool = pool(2);

        let result = pool.classify("data:image/png;base64,AAAA".to_string()).await;

        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[tokio::test]
    async fn concurrent_requests_are_all_answered() {
        let pool = pool(2);

        let requests = (0..6).map(|_| {
            let pool = pool.clone();
            tokio::spawn(async move { pool.classify("no comma".to_string()).await })
        });

        for request in requests.collect::<Vec<_>>() {
            let result = request.await.unwrap();
            assert!(matches!(result, Err(Error::Payload(_))));
        }
    }
}
