use std::collections::{HashMap, HashSet};

use rand::Rng;

use super::shuffle::fisher_yates;
use super::types::{Committee, Observer, ObserverRole, PinnedSeat, RoomAssignment};

/// Result of one distribution run, before it is frozen into history.
#[derive(Debug, Clone)]
pub struct Distribution {
    pub rooms: Vec<RoomAssignment>,
    pub monitors: Vec<Observer>,
    pub reserves: Vec<Observer>,
    pub warning: Option<String>,
}

/// Runs the daily assignment for one exam day.
///
/// Present proctors are split into pinned ("fixed") and pool; the pool is
/// shuffled with the injected rng and rooms are filled committee by
/// committee, room numbers ascending. Pinned proctors take their seats
/// first, in roster order; remaining seats are drawn from the pool in
/// shuffle order. Whatever is left over, plus pinned proctors whose seat
/// no longer exists, joins the fixed reserves.
///
/// Insufficient staffing is a warning, not an error; the run completes
/// with under-filled or empty rooms. Only empty inputs abort the run.
pub fn run_distribution<R: Rng>(
    roster: &[Observer],
    committees: &[Committee],
    absent: &HashSet<String>,
    pins: &HashMap<String, PinnedSeat>,
    rng: &mut R,
) -> Result<Distribution, String> {
    if roster.is_empty() || committees.is_empty() {
        return Err("Add observers and committees before running a distribution".to_string());
    }

    // Only staff present today take part in any downstream step.
    let present: Vec<&Observer> = roster.iter().filter(|o| !absent.contains(&o.id)).collect();

    let monitors: Vec<Observer> = present
        .iter()
        .filter(|o| o.role == ObserverRole::Monitor)
        .map(|o| (*o).clone())
        .collect();
    let fixed_reserves: Vec<&Observer> = present
        .iter()
        .filter(|o| o.role == ObserverRole::Reserve)
        .copied()
        .collect();
    let proctors: Vec<&Observer> = present
        .iter()
        .filter(|o| o.role == ObserverRole::Proctor)
        .copied()
        .collect();

    // Pinned proctors keep roster order; everyone else goes into the pool.
    let mut fixed: Vec<&Observer> = Vec::new();
    let mut pool: Vec<&Observer> = Vec::new();
    for obs in proctors {
        if pins.contains_key(&obs.id) {
            fixed.push(obs);
        } else {
            pool.push(obs);
        }
    }

    let total_required: usize = committees
        .iter()
        .map(|c| (c.sub_committees * c.observers_per_room) as usize)
        .sum();
    let present_proctors = fixed.len() + pool.len();
    let warning = if present_proctors < total_required {
        Some(format!(
            "Only {} proctors are present for {} room seats; {} seats will stay unfilled",
            present_proctors,
            total_required,
            total_required - present_proctors
        ))
    } else {
        None
    };

    fisher_yates(&mut pool, rng);

    let mut rooms: Vec<RoomAssignment> = Vec::new();
    let mut pool_idx = 0usize;

    for committee in committees {
        for number in 1..=committee.sub_committees {
            let required = committee.observers_per_room as usize;
            let mut occupants: Vec<Observer> = Vec::new();

            // Pinned seats first, never past room capacity.
            for obs in &fixed {
                if occupants.len() >= required {
                    break;
                }
                if let Some(seat) = pins.get(&obs.id) {
                    if seat.committee_id == committee.id && seat.sub_committee == number {
                        occupants.push((*obs).clone());
                    }
                }
            }

            // Remaining seats come from the shuffled pool, in shuffle order.
            while occupants.len() < required && pool_idx < pool.len() {
                occupants.push(pool[pool_idx].clone());
                pool_idx += 1;
            }

            if !occupants.is_empty() {
                rooms.push(RoomAssignment {
                    committee_name: committee.name.clone(),
                    sub_committee: number,
                    observers: occupants,
                });
            }
        }
    }

    let leftovers = pool[pool_idx..].iter().map(|o| (*o).clone());

    // Pinned proctors whose seat was never reached (deleted committee,
    // out-of-range room, or an over-subscribed seat) fall back to reserves.
    let assigned: HashSet<&str> = rooms
        .iter()
        .flat_map(|r| r.observers.iter().map(|o| o.id.as_str()))
        .collect();
    let unused_fixed = fixed
        .iter()
        .filter(|o| !assigned.contains(o.id.as_str()))
        .map(|o| (*o).clone());

    let mut reserves: Vec<Observer> = fixed_reserves.iter().map(|o| (*o).clone()).collect();
    reserves.extend(leftovers);
    reserves.extend(unused_fixed);

    Ok(Distribution {
        rooms,
        monitors,
        reserves,
        warning,
    })
}
