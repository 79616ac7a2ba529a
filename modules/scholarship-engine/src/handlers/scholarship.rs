//! Events emitted by registered scholarship contracts.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use scholarship_common::{
    milestone_key, Company, IndexerError, Milestone, Scholar, Scholarship, Transaction,
};
use scholarship_probe::{discover_approved_students, ContractReader, Probe};
use scholarship_store::{EntityStore, EntityStoreExt};
use scholarship_world::{Address, Amount, ScholarshipEvent};

use super::{Context, Handled};
use crate::engine::SkipReason;

pub async fn handle<S, R>(
    ctx: &Context<'_, S, R>,
    event: &ScholarshipEvent,
) -> Result<Handled, IndexerError>
where
    S: EntityStore + ?Sized,
    R: ContractReader + ?Sized,
{
    match event {
        ScholarshipEvent::StudentApplied { student } => student_applied(ctx, *student).await,
        ScholarshipEvent::StudentApproved { student } => student_approved(ctx, *student).await,
        ScholarshipEvent::MilestoneCompleted {
            student,
            milestone_id,
        } => milestone_completed(ctx, *student, *milestone_id).await,
        ScholarshipEvent::FundsReleased {
            student,
            amount,
            milestone_id,
        } => funds_released(ctx, *student, *amount, *milestone_id).await,
        ScholarshipEvent::ScholarshipStatusUpdated { status } => {
            status_updated(ctx, *status).await
        }
        ScholarshipEvent::ScholarshipDetailsUpdated {
            new_title,
            new_description,
            new_gpa,
            new_additional_requirements,
            new_deadline,
        } => {
            let Some(mut scholarship) = load_scholarship(ctx).await? else {
                return Ok(Handled::Skipped(SkipReason::MissingScholarship));
            };
            scholarship.title = new_title.clone();
            scholarship.description = new_description.clone();
            scholarship.gpa = *new_gpa;
            scholarship.additional_requirements = new_additional_requirements.clone();
            scholarship.deadline = *new_deadline;
            scholarship.updated_at = ctx.meta.block_timestamp;
            ctx.store.save(&scholarship).await?;
            Ok(Handled::done())
        }
    }
}

// ---------------------------------------------------------------------------
// Applications and approvals
// ---------------------------------------------------------------------------

async fn student_applied<S, R>(
    ctx: &Context<'_, S, R>,
    student: Address,
) -> Result<Handled, IndexerError>
where
    S: EntityStore + ?Sized,
    R: ContractReader + ?Sized,
{
    let at = ctx.meta.block_timestamp;
    let mut scholar = ctx
        .store
        .load_or_else(&student.to_string(), || Scholar::new(student, at))
        .await?;

    if !scholar.apply(ctx.meta.address) {
        debug!(%student, scholarship = %ctx.meta.address, "Repeat application ignored");
    }
    scholar.updated_at = at;
    ctx.store.save(&scholar).await?;
    Ok(Handled::done())
}

async fn student_approved<S, R>(
    ctx: &Context<'_, S, R>,
    student: Address,
) -> Result<Handled, IndexerError>
where
    S: EntityStore + ?Sized,
    R: ContractReader + ?Sized,
{
    let Some(mut scholar) = ctx.store.load::<Scholar>(&student.to_string()).await? else {
        return Ok(Handled::Skipped(SkipReason::MissingScholar));
    };
    let Some(scholarship) = load_scholarship(ctx).await? else {
        return Ok(Handled::Skipped(SkipReason::MissingScholarship));
    };

    let at = ctx.meta.block_timestamp;
    let first_approval = scholar.approve(scholarship.id, scholarship.total_milestones);
    scholar.recompute_completion();
    scholar.updated_at = at;
    ctx.store.save(&scholar).await?;

    if !first_approval {
        debug!(%student, scholarship = %scholarship.id, "Repeat approval ignored");
        return Ok(Handled::done());
    }

    match ctx.store.load::<Company>(&scholarship.company.to_string()).await? {
        Some(mut company) => {
            company.approve_scholar();
            company.updated_at = at;
            ctx.store.save(&company).await?;
        }
        None => debug!(company = %scholarship.company, "Company not found, counters untouched"),
    }

    Ok(Handled::done())
}

// ---------------------------------------------------------------------------
// Milestones and funds
// ---------------------------------------------------------------------------

async fn milestone_completed<S, R>(
    ctx: &Context<'_, S, R>,
    student: Address,
    milestone_id: u64,
) -> Result<Handled, IndexerError>
where
    S: EntityStore + ?Sized,
    R: ContractReader + ?Sized,
{
    let key = milestone_key(ctx.meta.address, milestone_id);
    let Some(mut milestone) = ctx.store.load::<Milestone>(&key).await? else {
        return Ok(Handled::Skipped(SkipReason::MissingMilestone));
    };

    let at = ctx.meta.block_timestamp;
    let newly_completed = milestone.complete(student, at);
    ctx.store.save(&milestone).await?;

    if newly_completed {
        record_completion(ctx, student, at).await?;
    } else {
        debug!(milestone = %key, "Milestone already completed");
    }
    Ok(Handled::done())
}

async fn funds_released<S, R>(
    ctx: &Context<'_, S, R>,
    student: Address,
    amount: Amount,
    milestone_id: u64,
) -> Result<Handled, IndexerError>
where
    S: EntityStore + ?Sized,
    R: ContractReader + ?Sized,
{
    let meta = &ctx.meta;
    let at = meta.block_timestamp;
    let key = milestone_key(meta.address, milestone_id);

    // Recorded even when nothing it references exists.
    let transaction = Transaction {
        id: meta.log_id(),
        scholarship: meta.address,
        student,
        milestone: key.clone(),
        amount,
        milestone_id,
        block_number: meta.block_number,
        block_timestamp: at,
        transaction_hash: meta.transaction_hash,
    };
    ctx.store.save(&transaction).await?;

    match ctx.store.load::<Milestone>(&key).await? {
        Some(mut milestone) => {
            let newly_completed = milestone.release_funds(student, at);
            ctx.store.save(&milestone).await?;
            if newly_completed {
                record_completion(ctx, student, at).await?;
            }
        }
        None => debug!(milestone = %key, "Milestone not found"),
    }

    match ctx.store.load::<Scholar>(&student.to_string()).await? {
        Some(mut scholar) => {
            scholar.receive_funds(amount);
            scholar.updated_at = at;
            ctx.store.save(&scholar).await?;
        }
        None => debug!(%student, "Scholar not found"),
    }

    let Some(mut scholarship) = load_scholarship(ctx).await? else {
        debug!(scholarship = %meta.address, "Scholarship not found");
        return Ok(Handled::done());
    };
    scholarship.release_funds(amount);
    scholarship.updated_at = at;
    ctx.store.save(&scholarship).await?;

    match ctx.store.load::<Company>(&scholarship.company.to_string()).await? {
        Some(mut company) => {
            company.release_funds(amount);
            company.updated_at = at;
            ctx.store.save(&company).await?;
        }
        None => debug!(company = %scholarship.company, "Company not found"),
    }

    Ok(Handled::done())
}

/// Bookkeeping for a milestone that just became completed: bump the
/// scholarship's and the student's counters and recompute both percentages.
async fn record_completion<S, R>(
    ctx: &Context<'_, S, R>,
    student: Address,
    at: DateTime<Utc>,
) -> Result<(), IndexerError>
where
    S: EntityStore + ?Sized,
    R: ContractReader + ?Sized,
{
    match load_scholarship(ctx).await? {
        Some(mut scholarship) => {
            if !scholarship.complete_milestone() {
                debug!(scholarship = %scholarship.id, "Completed count already at total");
            }
            scholarship.recompute_completion();
            scholarship.updated_at = at;
            ctx.store.save(&scholarship).await?;
        }
        None => debug!(scholarship = %ctx.meta.address, "Scholarship not found"),
    }

    match ctx.store.load::<Scholar>(&student.to_string()).await? {
        Some(mut scholar) => {
            if !scholar.complete_milestone() {
                debug!(%student, "Scholar completed count already at total");
            }
            scholar.recompute_completion();
            scholar.updated_at = at;
            ctx.store.save(&scholar).await?;
        }
        None => debug!(%student, "Scholar not found"),
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

async fn status_updated<S, R>(ctx: &Context<'_, S, R>, status: u8) -> Result<Handled, IndexerError>
where
    S: EntityStore + ?Sized,
    R: ContractReader + ?Sized,
{
    let Some(mut scholarship) = load_scholarship(ctx).await? else {
        return Ok(Handled::Skipped(SkipReason::MissingScholarship));
    };

    let at = ctx.meta.block_timestamp;
    scholarship.status = status;
    scholarship.updated_at = at;
    ctx.store.save(&scholarship).await?;

    if scholarship.is_open() {
        return Ok(Handled::done());
    }

    let probe = Probe::new(ctx.reader, scholarship.id);
    let students = discover_approved_students(&probe, ctx.discovery.max_approved_students).await;

    match ctx.store.load::<Company>(&scholarship.company.to_string()).await? {
        Some(mut company) => {
            let discovered = students.len() as u64;
            let removed = company.deactivate_scholars(discovered);
            if removed < discovered {
                warn!(
                    company = %company.id,
                    discovered,
                    removed,
                    "Active scholar count would go negative; clamped at zero"
                );
            }
            company.updated_at = at;
            ctx.store.save(&company).await?;
            info!(
                scholarship = %scholarship.id,
                status,
                discovered,
                removed,
                "Scholarship closed, scholars deactivated"
            );
        }
        None => debug!(company = %scholarship.company, "Company not found"),
    }

    for student in &students.items {
        match ctx.store.load::<Scholar>(&student.to_string()).await? {
            Some(mut scholar) => {
                scholar.is_active = false;
                scholar.updated_at = at;
                ctx.store.save(&scholar).await?;
            }
            None => debug!(%student, "Discovered scholar not in store"),
        }
    }

    Ok(Handled::done())
}

async fn load_scholarship<S, R>(ctx: &Context<'_, S, R>) -> Result<Option<Scholarship>, IndexerError>
where
    S: EntityStore + ?Sized,
    R: ContractReader + ?Sized,
{
    Ok(ctx.store.load::<Scholarship>(&ctx.meta.address.to_string()).await?)
}
