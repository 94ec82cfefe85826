#![warn(
    clippy::unwrap_used,
    clippy::cast_lossless,
    clippy::unimplemented,
    clippy::indexing_slicing,
    clippy::expect_used
)]
use bevy::prelude::*;
use std::{any, future, pin};

pub struct Plugin;

impl bevy::prelude::Plugin for Plugin {
    fn build(&self, app: &mut App) {
        app.add_systems(PreUpdate, check_system)
            .insert_resource(JobOutcomePayloads(vec![]));
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub type AsyncReturn<Output> = pin::Pin<Box<dyn future::Future<Output = Output> + Send + 'static>>;
#[cfg(target_arch = "wasm32")]
pub type AsyncReturn<Output> = pin::Pin<Box<dyn future::Future<Output = Output> + 'static>>;

pub trait Job: any::Any + Sized + Send + Sync + 'static {
    type Outcome: any::Any + Send + Sync;

    fn name(&self) -> String;

    fn perform(self, context: Context) -> AsyncReturn<Self::Outcome>;

    /// Starts the job on the async compute pool. The returned handle must be
    /// kept in the world for [`check_system`] to collect the outcome.
    fn start(self) -> InProgressJob {
        let (outcome_tx, outcome_recv) = async_channel::unbounded::<JobOutcomePayload>();
        let (progress_tx, progress_recv) = async_channel::unbounded::<Progress>();

        let job_name = self.name();
        let in_progress_job = InProgressJob {
            name: job_name.clone(),
            progress: 0,
            progress_recv,
            outcome_recv,
        };

        bevy::tasks::AsyncComputeTaskPool::get()
            .spawn(async move {
                let instant = instant::Instant::now();
                bevy::log::debug!("Starting job '{}'", job_name);
                let outcome = self.perform(Context { progress_tx }).await;
                bevy::log::debug!("Completed job '{}' in {:?}", job_name, instant.elapsed());
                if let Err(e) = outcome_tx
                    .send(JobOutcomePayload {
                        job_outcome_type_id: any::TypeId::of::<Self>(),
                        job_outcome: Box::new(outcome),
                    })
                    .await
                {
                    bevy::log::error!(
                        "Failed to send result from job {} back to main thread: {:?}",
                        job_name,
                        e
                    );
                }
            })
            .detach();

        in_progress_job
    }

    /// Starts the job and keeps its handle in `world`.
    fn spawn_in_world(self, world: &mut World) {
        world.spawn(self.start());
    }
}

pub fn check_system(
    mut query: Query<(&mut InProgressJob, Entity)>,
    mut commands: Commands,
    mut finished_jobs: ResMut<JobOutcomePayloads>,
) {
    for (mut in_progress_job, entity) in &mut query {
        if let Some(outcome) = in_progress_job.poll() {
            commands.entity(entity).despawn();
            finished_jobs.0.push(outcome);
        }
    }
}

pub struct Context {
    pub progress_tx: async_channel::Sender<Progress>,
}

impl Context {
    pub fn send_progress(&self, progress: Progress) -> async_channel::Send<u8> {
        self.progress_tx.send(progress)
    }
}

pub struct JobOutcomePayload {
    pub job_outcome_type_id: any::TypeId,
    pub job_outcome: Box<dyn any::Any + Send + Sync>,
}

pub type Progress = u8;
pub type ProgressSender = async_channel::Sender<Progress>;

#[derive(Component)]
pub struct InProgressJob {
    pub name: String,
    pub progress: Progress,
    pub progress_recv: async_channel::Receiver<Progress>,
    pub outcome_recv: async_channel::Receiver<JobOutcomePayload>,
}

impl InProgressJob {
    /// Drains pending progress and returns the outcome once the job is done.
    pub fn poll(&mut self) -> Option<JobOutcomePayload> {
        while let Ok(progress) = self.progress_recv.try_recv() {
            self.progress = progress;
        }
        self.outcome_recv.try_recv().ok()
    }
}

/// Outcomes of finished jobs, waiting to be claimed by type.
#[derive(Resource, Default)]
pub struct JobOutcomePayloads(Vec<JobOutcomePayload>);

pub type FinishedJobs<'w> = ResMut<'w, JobOutcomePayloads>;

impl JobOutcomePayloads {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, outcome: JobOutcomePayload) {
        self.0.push(outcome);
    }

    #[inline]
    pub fn take_next<J: Job>(&mut self) -> Option<J::Outcome> {
        let index = self
            .0
            .iter()
            .position(|outcome_payload| {
                any::TypeId::of::<J>() == outcome_payload.job_outcome_type_id
                    && outcome_payload.job_outcome.is::<J::Outcome>()
            })?;
        let outcome_payload = self.0.remove(index);
        let outcome = outcome_payload.job_outcome.downcast::<J::Outcome>();
        if outcome.is_err() {
            bevy::log::error!("encountered unexpected job result type");
        }
        outcome.map(|n| *n).ok()
    }
}
