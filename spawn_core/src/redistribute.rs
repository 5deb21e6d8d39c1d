use crate::pool::SpawnPool;

/// A pool asking for `desired` percent of the draw.
#[derive(Debug, Clone, Copy)]
pub struct PoolRequest<'a> {
    pub pool: &'a SpawnPool,
    pub desired: f64,
}

impl<'a> PoolRequest<'a> {
    pub fn new(pool: &'a SpawnPool, desired: f64) -> Self {
        Self { pool, desired }
    }
}

/// Reconciles pool demands so that dynamic and event pools get room carved
/// out of the plain static pools.
///
/// Static pools donate proportionally to their own desired share. When the
/// extra demand exceeds everything the static pools hold, they drop to zero
/// and every non-deductible pool keeps its base plus a scaled share of its
/// requested extra. Output order matches input order.
pub fn redistribute<'a>(requests: &[PoolRequest<'a>]) -> Vec<(&'a SpawnPool, f64)> {
    let mut deductible_total = 0.0;
    let mut requested = 0.0;
    let mut owned = 0.0;
    for request in requests {
        if request.pool.is_deductible() {
            deductible_total += request.desired;
        } else {
            requested += request.desired;
            owned += request.pool.base_percentage.max(0.0);
        }
    }
    let extra_needed = requested - owned;

    if extra_needed <= 0.0 || deductible_total <= 0.0 {
        return requests
            .iter()
            .map(|request| (request.pool, request.desired))
            .collect();
    }

    if extra_needed <= deductible_total {
        return requests
            .iter()
            .map(|request| {
                if request.pool.is_deductible() {
                    let donation = extra_needed * (request.desired / deductible_total);
                    (request.pool, (request.desired - donation).max(0.0))
                } else {
                    (request.pool, request.desired)
                }
            })
            .collect();
    }

    let scale = deductible_total / extra_needed;
    requests
        .iter()
        .map(|request| {
            if request.pool.is_deductible() {
                (request.pool, 0.0)
            } else {
                let base = request.pool.base_percentage.max(0.0);
                (request.pool, base + (request.desired - base) * scale)
            }
        })
        .collect()
}
