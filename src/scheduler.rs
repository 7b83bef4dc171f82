// src/scheduler.rs

pub mod jobs;
pub use jobs::{register_recalculation_jobs, RecalculationServices};

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, TimeZone, Utc};
use tokio::{
    task::{AbortHandle, JoinHandle},
    time::{self, Instant, MissedTickBehavior},
};

type JobFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;
type JobFn = Arc<dyn Fn() -> JobFuture + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Primeira execução após `initial_delay`, depois a cada `every`.
    Interval {
        every: Duration,
        initial_delay: Duration,
    },
    /// Uma vez por dia, no horário UTC indicado.
    DailyAt { hour: u32, minute: u32 },
}

struct ScheduledJob {
    name: String,
    trigger: Trigger,
    run: JobFn,
}

/// Agendador em processo. Cada job roda na sua própria task e nunca se sobrepõe a si mesmo.
#[derive(Default)]
pub struct Scheduler {
    jobs: Vec<ScheduledJob>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_job<F, Fut>(&mut self, name: impl Into<String>, trigger: Trigger, job: F) -> &mut Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        tracing::info!(job = %name, ?trigger, "Job registrado");

        self.jobs.push(ScheduledJob {
            name,
            trigger,
            run: Arc::new(move || -> JobFuture { Box::pin(job()) }),
        });
        self
    }

    pub fn job_names(&self) -> Vec<&str> {
        self.jobs.iter().map(|j| j.name.as_str()).collect()
    }

    /// Dispara uma task por job. Precisa de um runtime tokio ativo.
    pub fn start(self) -> SchedulerHandle {
        let tasks = self
            .jobs
            .into_iter()
            .map(|job| {
                let name = job.name.clone();
                (name, tokio::spawn(run_job_loop(job)))
            })
            .collect();

        SchedulerHandle { tasks }
    }
}

pub struct SchedulerHandle {
    tasks: Vec<(String, JoinHandle<()>)>,
}

impl SchedulerHandle {
    pub fn job_count(&self) -> usize {
        self.tasks.len()
    }

    /// Cancela todos os jobs, inclusive execuções em andamento (no próximo `.await` delas).
    pub fn shutdown(self) {
        for (name, task) in self.tasks {
            task.abort();
            tracing::debug!(job = %name, "Job cancelado");
        }
        tracing::info!("Agendador encerrado");
    }
}

async fn run_job_loop(job: ScheduledJob) {
    match job.trigger {
        Trigger::Interval { every, initial_delay } => {
            let mut ticker = time::interval_at(Instant::now() + initial_delay, every);
            // tick perdido durante uma execução longa é descartado, não acumulado
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                execute(&job).await;
            }
        }
        Trigger::DailyAt { hour, minute } => loop {
            let now = Utc::now();
            let wait = (next_daily_run(now, hour, minute) - now)
                .to_std()
                .unwrap_or_default();
            time::sleep(wait).await;
            execute(&job).await;
        },
    }
}

// Cancelar o laço também cancela a execução em andamento.
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn execute(job: &ScheduledJob) {
    tracing::info!(job = %job.name, "Executando job agendado");
    let started = Instant::now();

    // Roda em task separada para que um panic não derrube o laço do agendador.
    let task = tokio::spawn((job.run)());
    let _guard = AbortOnDrop(task.abort_handle());

    match task.await {
        Ok(()) => tracing::debug!(
            job = %job.name,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Job finalizado"
        ),
        Err(e) if e.is_panic() => {
            tracing::error!(job = %job.name, "Job entrou em pânico; mantendo o agendamento")
        }
        Err(e) => tracing::warn!(job = %job.name, error = %e, "Job cancelado"),
    }
}

/// Próxima ocorrência de `hour:minute` (UTC) estritamente depois de `now`.
pub fn next_daily_run(now: DateTime<Utc>, hour: u32, minute: u32) -> DateTime<Utc> {
    let today = now.date_naive();
    let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
    let candidate = Utc.from_utc_datetime(&today.and_time(time));

    if candidate > now {
        candidate
    } else {
        candidate + ChronoDuration::days(1)
    }
}
