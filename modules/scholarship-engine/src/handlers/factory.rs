//! Factory events: ownership audit and scholarship creation.

use tracing::{debug, warn};

use scholarship_common::{
    milestone_key, Company, IndexerError, Milestone, OwnershipTransferredLog, Scholarship,
    ScholarshipCreatedLog, STATUS_OPEN,
};
use scholarship_probe::{ContractReader, Probe, Probed};
use scholarship_store::{EntityStore, EntityStoreExt};
use scholarship_world::{Address, Amount, FactoryEvent};

use super::{Context, Handled};
use crate::engine::Effect;

pub async fn handle<S, R>(ctx: &Context<'_, S, R>, event: &FactoryEvent) -> Result<Handled, IndexerError>
where
    S: EntityStore + ?Sized,
    R: ContractReader + ?Sized,
{
    match event {
        FactoryEvent::OwnershipTransferred {
            previous_owner,
            new_owner,
        } => {
            let log = OwnershipTransferredLog::new(&ctx.meta, *previous_owner, *new_owner);
            ctx.store.save(&log).await?;
            Ok(Handled::done())
        }

        FactoryEvent::ScholarshipCreated {
            scholarship_address,
            company,
            scholarship_title,
            total_amount,
            scholarship_id,
        } => {
            scholarship_created(
                ctx,
                *scholarship_address,
                *company,
                scholarship_title,
                *total_amount,
                *scholarship_id,
            )
            .await
        }
    }
}

async fn scholarship_created<S, R>(
    ctx: &Context<'_, S, R>,
    scholarship_address: Address,
    company_address: Address,
    title: &str,
    total_amount: Amount,
    scholarship_id: u64,
) -> Result<Handled, IndexerError>
where
    S: EntityStore + ?Sized,
    R: ContractReader + ?Sized,
{
    let meta = &ctx.meta;
    let at = meta.block_timestamp;

    let creation_log = ScholarshipCreatedLog {
        id: meta.log_id(),
        scholarship_address,
        company: company_address,
        scholarship_title: title.to_string(),
        total_amount,
        scholarship_id,
        block_number: meta.block_number,
        block_timestamp: at,
        transaction_hash: meta.transaction_hash,
    };
    ctx.store.save(&creation_log).await?;

    // Redelivered creation. Existing state stays as it is.
    let existing = ctx
        .store
        .load::<Scholarship>(&scholarship_address.to_string())
        .await?;
    if existing.is_some() {
        debug!(
            scholarship = %scholarship_address,
            "Scholarship already indexed, creation not reapplied"
        );
        return Ok(Handled::Applied(vec![Effect::RegisterSource(
            scholarship_address,
        )]));
    }

    let mut company = ctx
        .store
        .load_or_else(&company_address.to_string(), || Company::new(company_address, at))
        .await?;
    company.add_scholarship(total_amount);
    company.updated_at = at;
    ctx.store.save(&company).await?;

    // Fields the event does not carry. Each read falls back on its own.
    let probe = Probe::new(ctx.reader, scholarship_address);
    let description = probe.description().await.or_default();
    let eligibility = probe.eligibility().await.or_default();
    let deadline = probe.deadline().await.or(0);
    let status = probe.status().await.or(STATUS_OPEN);
    let total_milestones = probe.total_milestones().await.or(0);

    let completed_milestones =
        create_milestones(ctx, &probe, scholarship_address, total_milestones).await?;

    let mut scholarship = Scholarship {
        id: scholarship_address,
        scholarship_id,
        title: title.to_string(),
        description,
        gpa: eligibility.gpa,
        additional_requirements: eligibility.additional_requirements,
        deadline,
        status,
        total_amount,
        remaining_amount: total_amount,
        company: company_address,
        total_milestones,
        completed_milestones: completed_milestones.min(total_milestones),
        completion_percentage: Default::default(),
        creation_log: Some(creation_log.id.clone()),
        created_at: at,
        updated_at: at,
    };
    scholarship.recompute_completion();
    ctx.store.save(&scholarship).await?;

    debug!(
        scholarship = %scholarship_address,
        company = %company_address,
        total_milestones,
        "Scholarship created"
    );

    Ok(Handled::Applied(vec![Effect::RegisterSource(
        scholarship_address,
    )]))
}

/// One milestone row per index the contract reports. Unreadable indices are
/// skipped. Returns how many of the created rows are already completed.
async fn create_milestones<S, R>(
    ctx: &Context<'_, S, R>,
    probe: &Probe<'_, R>,
    scholarship: Address,
    total: u64,
) -> Result<u64, IndexerError>
where
    S: EntityStore + ?Sized,
    R: ContractReader + ?Sized,
{
    let cap = u64::from(ctx.discovery.max_milestones);
    if total > cap {
        warn!(
            %scholarship,
            total,
            cap,
            "Milestone count exceeds probe cap; only the first {cap} are read"
        );
    }

    let at = ctx.meta.block_timestamp;
    let mut completed = 0;

    for index in 0..total.min(cap) {
        let info = match probe.milestone(index).await {
            Probed::Value(info) => info,
            Probed::Unavailable => {
                debug!(%scholarship, index, "Milestone unreadable, skipped");
                continue;
            }
        };

        // Released funds imply completion.
        let is_completed = info.is_completed || info.funds_released;
        if is_completed {
            completed += 1;
        }

        let milestone = Milestone {
            id: milestone_key(scholarship, index),
            scholarship,
            milestone_id: index,
            title: info.title,
            amount: info.amount,
            is_completed,
            funds_released: info.funds_released,
            student: None,
            completed_at: is_completed.then_some(at),
            funds_released_at: info.funds_released.then_some(at),
            created_at: at,
            updated_at: at,
        };
        ctx.store.save(&milestone).await?;
    }

    Ok(completed)
}
