// src/scheduler/jobs.rs

use std::sync::Arc;

use crate::{
    config::{JobSchedule, ScheduleConfig},
    scheduler::{Scheduler, Trigger},
    services::{ClientCategoryService, InventoryMetric, InventoryMetricsService, SatisfactionService},
};

/// Serviços que os jobs de recálculo chamam. Passados explicitamente ao registrar.
#[derive(Clone)]
pub struct RecalculationServices {
    pub inventory: Arc<InventoryMetricsService>,
    pub client_category: Arc<ClientCategoryService>,
    pub satisfaction: Arc<SatisfactionService>,
}

fn interval(schedule: JobSchedule) -> Trigger {
    Trigger::Interval {
        every: schedule.every,
        initial_delay: schedule.initial_delay,
    }
}

/// Registra os seis jobs de recálculo.
pub fn register_recalculation_jobs(
    scheduler: &mut Scheduler,
    services: RecalculationServices,
    schedule: &ScheduleConfig,
) {
    for metric in InventoryMetric::ALL {
        let every = match metric {
            InventoryMetric::TotalProducts => schedule.total_products,
            InventoryMetric::LowInventory => schedule.low_inventory,
            InventoryMetric::CriticalInventory => schedule.critical_inventory,
            InventoryMetric::TotalValue => schedule.total_value,
        };
        let service = services.inventory.clone();
        scheduler.add_job(metric.job_name(), interval(every), move || {
            let service = service.clone();
            async move {
                service.recalc_all_companies(metric).await;
            }
        });
    }

    let service = services.client_category.clone();
    scheduler.add_job("client_category", interval(schedule.client_category), move || {
        let service = service.clone();
        async move {
            service.update_all_clients().await;
        }
    });

    let (hour, minute) = schedule.satisfaction_daily_at;
    let service = services.satisfaction;
    scheduler.add_job("satisfaction", Trigger::DailyAt { hour, minute }, move || {
        let service = service.clone();
        async move {
            service.update_all_companies_satisfaction().await;
        }
    });
}
