//! Plethysm of symmetric functions.
//!
//! Both operands are streams of symmetric functions in the power-sum basis,
//! graded by degree: the coefficient at `n` is homogeneous of degree `n`.
//! The plethysm `f[g]` substitutes `g` into `f` through the rule
//! `p_k[g] = g(x^k)`, which stretches partitions by `k` and raises the
//! degree-one generators of the coefficient ring to the `k`-th power.
//!
//! For a partition `λ` of `f`, the product `p_λ[g]` in degree `n` is
//! assembled from restricted powers of `g`: writing `λ` as part sizes `i`
//! with multiplicities `m`, it is a sum over all `d` with
//! `Σ i·d_i = n - ord(g)·|λ|` of `Π stretch_i((g^m)[ord(g)·m + d_i])`.

use brook_rings::{Partition, PowerSum, Ring, VariableRaising};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::hash::Hasher;
use std::sync::Arc;

use crate::binary::CauchyMulStream;
use crate::error::{Result, StreamError};
use crate::exact::ExactStream;
use crate::inexact::{CachedStream, Operator};
use crate::order::{OrderState, Valuation};
use crate::stream::{feed, feed_node, same_stream, SeriesCoeff, Stream, StreamRef};

/// A basis of symmetric functions that results are expressed in.
pub trait SymmetricBasis<R: SeriesCoeff>: Send + Sync + 'static {
    /// Elements of the target basis.
    type Element: SeriesCoeff;

    /// Converts from the power-sum basis.
    fn from_power_sum(&self, p: PowerSum<R>) -> Self::Element;
}

/// The power-sum basis itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct PowerSumBasis;

impl<R: SeriesCoeff> SymmetricBasis<R> for PowerSumBasis {
    type Element = PowerSum<R>;

    fn from_power_sum(&self, p: PowerSum<R>) -> PowerSum<R> {
        p
    }
}

/// Which generators of the coefficient ring count as degree one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlethysmOptions {
    include: Option<Vec<String>>,
    exclude: Vec<String>,
}

impl PlethysmOptions {
    /// Every generator of the coefficient ring has degree one.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses exactly the given generators instead of all of them.
    #[must_use]
    pub fn include<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.include = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Removes the given generators from the degree-one list.
    #[must_use]
    pub fn exclude<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.exclude.extend(names.into_iter().map(Into::into));
        self
    }

    /// The resolved degree-one generators for the ring `R`.
    #[must_use]
    pub fn degree_one<R: VariableRaising>(&self) -> Vec<String> {
        let names = self.include.clone().unwrap_or_else(R::generators);
        names.into_iter().filter(|v| !self.exclude.contains(v)).collect()
    }
}

/// The plethysm `f[g]`.
pub struct PlethysmOp<R: SeriesCoeff, B> {
    f: StreamRef<PowerSum<R>>,
    g: StreamRef<PowerSum<R>>,
    basis: B,
    sparse: bool,
    /// Degree of `f` when it has finite support.
    degree_f: Option<i64>,
    degree_one: Vec<String>,
    /// Entry `k` is `g^(k+1)`.
    powers: Mutex<Vec<StreamRef<PowerSum<R>>>>,
    stretched: Mutex<FxHashMap<(u32, u32, i64), PowerSum<R>>>,
}

/// The plethysm of two symmetric function streams, expressed in basis `B`.
pub type PlethysmStream<R, B> = CachedStream<<B as SymmetricBasis<R>>::Element, PlethysmOp<R, B>>;

impl<R, B> CachedStream<B::Element, PlethysmOp<R, B>>
where
    R: SeriesCoeff + VariableRaising,
    B: SymmetricBasis<R>,
{
    /// The plethysm `f[g]` with results in `basis`.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::PlethysmValuation`] when `g` is known to
    /// have valuation 0 and `f` is not an exact stream.
    pub fn new(
        f: StreamRef<PowerSum<R>>,
        g: StreamRef<PowerSum<R>>,
        basis: B,
        options: &PlethysmOptions,
        sparse: bool,
    ) -> Result<Self> {
        let degree_f = f
            .as_any()
            .downcast_ref::<ExactStream<PowerSum<R>>>()
            .map(ExactStream::degree);
        if degree_f.is_none() && g.known_order() == Some(Valuation::Finite(0)) {
            return Err(StreamError::PlethysmValuation);
        }
        let powers = Mutex::new(vec![Arc::clone(&g)]);
        Ok(Self::from_op(
            PlethysmOp {
                f,
                g,
                basis,
                sparse,
                degree_f,
                degree_one: options.degree_one::<R>(),
                powers,
                stretched: Mutex::new(FxHashMap::default()),
            },
            sparse,
        ))
    }
}

impl<R, B> PlethysmOp<R, B>
where
    R: SeriesCoeff + VariableRaising,
    B: SymmetricBasis<R>,
{
    /// The degree `n` part of `p_λ[g]`.
    fn compute_product(&self, n: i64, la: &Partition) -> Result<PowerSum<R>> {
        if la.is_empty() {
            return Ok(if n == 0 { PowerSum::one() } else { PowerSum::zero() });
        }
        let Valuation::Finite(rao) = self.g.approximate_order()? else {
            return Ok(PowerSum::zero());
        };
        let base = rao * i64::from(la.size());
        if n < base {
            return Ok(PowerSum::zero());
        }

        // Part sizes with their multiplicities, largest part first.
        let mut blocks: Vec<(u32, u32)> = (1..).zip(la.to_exp()).filter(|&(_, m)| m > 0).collect();
        blocks.reverse();
        let weights: Vec<i64> = blocks.iter().map(|&(i, _)| i64::from(i)).collect();

        let mut total = PowerSum::zero();
        'vectors: for degrees in weighted_vectors(n - base, &weights) {
            let mut product = PowerSum::one();
            for (&(i, m), d) in blocks.iter().zip(degrees) {
                let factor = self.stretched_power(i, m, rao * i64::from(m) + d)?;
                if factor.is_zero() {
                    continue 'vectors;
                }
                product = product * factor;
            }
            total = total + product;
        }
        Ok(total)
    }

    /// The degree `d * i` part of `p_i^m[g]`, i.e. `(g^m)[d]` stretched
    /// by `i`.
    fn stretched_power(&self, i: u32, m: u32, d: i64) -> Result<PowerSum<R>> {
        if let Some(cached) = self.stretched.lock().get(&(i, m, d)) {
            return Ok(cached.clone());
        }
        let power = self.power(m);
        let power_d = power.get(d)?;
        let result = if power_d.is_zero() {
            power_d
        } else {
            power_d.stretch(i, &self.degree_one)
        };
        self.stretched.lock().insert((i, m, d), result.clone());
        Ok(result)
    }

    /// `g^m` for `m >= 1`.
    fn power(&self, m: u32) -> StreamRef<PowerSum<R>> {
        let m = usize::try_from(m).unwrap_or(usize::MAX);
        let mut powers = self.powers.lock();
        while powers.len() < m {
            let last = Arc::clone(&powers[powers.len() - 1]);
            powers.push(CauchyMulStream::new(last, Arc::clone(&self.g), self.sparse).into_ref());
            tracing::trace!(power = powers.len(), "plethysm power grown");
        }
        Arc::clone(&powers[m.max(1) - 1])
    }
}

impl<R, B> Operator<B::Element> for PlethysmOp<R, B>
where
    R: SeriesCoeff + VariableRaising,
    B: SymmetricBasis<R>,
{
    fn initial_order(&self) -> Result<OrderState> {
        let gv = self.g.approximate_order()?;
        if gv < Valuation::Finite(0) {
            return Err(StreamError::PlethysmValuation);
        }
        Ok(OrderState::approximate(self.f.approximate_order()? * gv))
    }

    fn coefficient(&self, n: i64, _this: &dyn Stream<B::Element>) -> Result<B::Element> {
        let bound = if n == 0 {
            if self.g.get(0)?.is_zero() {
                1
            } else {
                self.degree_f.ok_or(StreamError::PlethysmValuation)?
            }
        } else {
            n + 1
        };
        let mut total = PowerSum::zero();
        if let Valuation::Finite(fv) = self.f.approximate_order()? {
            for k in fv..bound {
                let fk = self.f.get(k)?;
                for (la, c) in fk.terms() {
                    total = total + self.compute_product(n, la)?.scale(c);
                }
            }
        }
        Ok(self.basis.from_power_sum(total))
    }

    fn same_as(&self, other: &Self) -> bool {
        self.degree_one == other.degree_one
            && same_stream(self.f.as_ref(), other.f.as_ref())
            && same_stream(self.g.as_ref(), other.g.as_ref())
    }

    fn hash_into(&self, state: &mut dyn Hasher) {
        feed_node("plethysm", &[self.f.as_ref(), self.g.as_ref()], state);
        feed(&self.degree_one, state);
    }

    fn is_uninitialized(&self) -> bool {
        self.f.is_uninitialized() || self.g.is_uninitialized()
    }
}

/// All vectors `d >= 0` with `Σ d_j * weights_j == n`.
fn weighted_vectors(n: i64, weights: &[i64]) -> Vec<Vec<i64>> {
    let Some((&w, rest)) = weights.split_first() else {
        return if n == 0 { vec![Vec::new()] } else { Vec::new() };
    };
    let mut vectors = Vec::new();
    for k in 0..=n / w {
        for tail in weighted_vectors(n - k * w, rest) {
            let mut v = Vec::with_capacity(weights.len());
            v.push(k);
            v.extend(tail);
            vectors.push(v);
        }
    }
    vectors
}
