//! Deadlock-free double acquisition.
//!
//! Even-numbered philosophers reach right first, odd-numbered ones left
//! first. Not every philosopher queues in the same rotational direction, so
//! no cycle can form in the wait-for graph.

use crate::error::CoreError;
use crate::herald::{Event, Herald};
use crate::philosopher::{Philosopher, PhilosopherId};
use crate::ring::{ForkRing, Side};
use philo_env::CountingSemaphore;

/// Order in which `id` acquires its two forks.
pub fn grab_order(id: PhilosopherId) -> [Side; 2] {
    if id.is_even() {
        [Side::Right, Side::Left]
    } else {
        [Side::Left, Side::Right]
    }
}

/// Takes both forks of `philosopher` in protocol order, announcing each one.
///
/// Returns holding both forks, or with an error holding neither.
pub fn take_forks<S, H>(
    ring: &ForkRing<S>,
    philosopher: &Philosopher,
    herald: &H,
) -> Result<(), CoreError>
where
    S: CountingSemaphore,
    H: Herald + ?Sized,
{
    let who = philosopher.id();
    let seat = philosopher.seat();
    let [first, second] = grab_order(who).map(|side| seat.fork(side));

    ring.take(first, who)?;
    if let Err(err) = herald.proclaim(who, Event::TakenFork) {
        ring.put_down(first, who)?;
        return Err(err);
    }

    if let Err(err) = ring.take(second, who) {
        ring.put_down(first, who)?;
        return Err(err);
    }
    if let Err(err) = herald.proclaim(who, Event::TakenFork) {
        put_down_forks(ring, philosopher)?;
        return Err(err);
    }
    Ok(())
}

/// Returns both forks. Never blocks.
pub fn put_down_forks<S: CountingSemaphore>(
    ring: &ForkRing<S>,
    philosopher: &Philosopher,
) -> Result<(), CoreError> {
    let who = philosopher.id();
    let seat = philosopher.seat();
    let left = ring.put_down(seat.left, who);
    let right = ring.put_down(seat.right, who);
    left.and(right)
}
