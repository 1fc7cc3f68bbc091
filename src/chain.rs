//! Chain coordinates: reorder particles along a nearest-neighbor chain so
//! close encounters are represented as direct relative vectors instead of
//! `pos[i] - pos[j]`, which cancels catastrophically when `i` and `j` are
//! close. Grounded on `particle-system/chain.hpp`.
//!
//! Only the **bijective** transfer variant is implemented (§9 open question,
//! resolved): `chain_pos[N-1]` stores the absolute position of the chain's
//! first index rather than zero, so `to_chain`/`to_cartesian` are exact
//! inverses with no center-of-mass correction step.

use crate::error::SpaceHubError;
use crate::scalar::Scalar;
use crate::vector::Vector;

/// Build the chain index: a permutation of `0..pos.len()` such that adjacent
/// entries are nearest-neighbor-ordered.
///
/// Greedy construction: sort all `N(N-1)/2` pairs by squared distance
/// ascending, then repeatedly extend the chain with the next unused pair
/// that attaches to exactly one current endpoint (§4.7). The shortest pair
/// seeds the chain.
pub fn calc_chain_index<T: Scalar>(pos: &[Vector<T>]) -> Result<Vec<usize>, SpaceHubError> {
    let n = pos.len();
    if n < 2 {
        return Err(SpaceHubError::DegenerateChain { n });
    }

    let mut dist = Vec::with_capacity(n * (n - 1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            let d = pos[j] - pos[i];
            dist.push((d.norm2(), i, j));
        }
    }
    dist.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

    let (_, mut head, mut tail) = dist[0];
    let mut chain: std::collections::VecDeque<usize> = std::collections::VecDeque::new();
    chain.push_back(head);
    chain.push_back(tail);
    let mut chained = 1usize;

    let mut k = 1;
    while chained < n {
        let (_, i, j) = dist[k];
        let attach = if head == i {
            Some((j, true))
        } else if head == j {
            Some((i, true))
        } else if tail == i {
            Some((j, false))
        } else if tail == j {
            Some((i, false))
        } else {
            None
        };

        if let Some((idx, front)) = attach {
            if !chain.contains(&idx) {
                if front {
                    chain.push_front(idx);
                    head = idx;
                } else {
                    chain.push_back(idx);
                    tail = idx;
                }
                chained += 1;
                k = 0; // restart the scan, matching `k = 1` before the loop's own increment
            }
        }
        k += 1;
    }

    Ok(chain.into_iter().collect())
}

/// Cartesian -> chain: `chain_pos[k] = cart[idx[k+1]] - cart[idx[k]]` for
/// `k < N-1`; `chain_pos[N-1] = cart[idx[0]]` (bijective anchor).
pub fn to_chain<T: Scalar>(cartesian: &[Vector<T>], idx: &[usize]) -> Vec<Vector<T>> {
    let n = cartesian.len();
    let mut chain = vec![Vector::zero(); n];
    chain[n - 1] = cartesian[idx[0]];
    for k in 0..n - 1 {
        chain[k] = cartesian[idx[k + 1]] - cartesian[idx[k]];
    }
    chain
}

/// Chain -> Cartesian: cumulative sum, the inverse of [`to_chain`].
pub fn to_cartesian<T: Scalar>(chain: &[Vector<T>], idx: &[usize]) -> Vec<Vector<T>> {
    let n = chain.len();
    let mut cartesian = vec![Vector::zero(); n];
    cartesian[idx[0]] = chain[n - 1];
    for i in 1..n {
        cartesian[idx[i]] = cartesian[idx[i - 1]] + chain[i - 1];
    }
    cartesian
}

/// Reindex chain coordinates from `idx` to `new_idx` without round-tripping
/// through Cartesian coordinates, preserving accumulated precision (§4.7).
pub fn update_chain<T: Scalar>(
    chain: &[Vector<T>],
    idx: &[usize],
    new_idx: &[usize],
) -> Vec<Vector<T>> {
    let n = chain.len();
    let position_of = |value: usize| idx.iter().position(|&v| v == value).unwrap();

    let connect = |first: usize, last: usize| -> Vector<T> {
        let mut sum = chain[first];
        for j in (first + 1)..last {
            sum += chain[j];
        }
        sum
    };

    let new_node = |head: usize, tail: usize| -> Vector<T> {
        if head > tail {
            -connect(tail, head)
        } else {
            connect(head, tail)
        }
    };

    let mut new_chain = Vec::with_capacity(n);
    for i in 0..n - 1 {
        let first = position_of(new_idx[i]);
        let last = position_of(new_idx[i + 1]);
        new_chain.push(new_node(first, last));
    }

    let head = new_node(0, position_of(new_idx[0]));
    new_chain.push(chain[n - 1] + head);

    new_chain
}
