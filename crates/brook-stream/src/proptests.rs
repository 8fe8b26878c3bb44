//! Property-based tests for the stream engine.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use std::sync::Arc;

    use crate::{
        AddStream, CauchyInverseStream, CauchyMulStream, ExactStream, FunctionStream, InfiniteProduct, ShiftStream,
        Stream, StreamRef, SubStream, Valuation,
    };
    use brook_rings::{Ring, Q};

    const RANGE: std::ops::Range<i64> = -6..14;

    fn q(n: i64) -> Q {
        Q::from_integer(n)
    }

    /// Coefficients with at least one nonzero entry, and a starting index.
    fn laurent_part() -> impl Strategy<Value = (Vec<i64>, i64)> {
        (
            prop::collection::vec(-5i64..5, 1..6).prop_filter("must be nonzero", |cs| cs.iter().any(|&c| c != 0)),
            -3i64..4,
        )
    }

    /// A stream that reads its coefficients through a closure, so that no
    /// closed form is available to the engine.
    fn lazy(coefficients: &[i64], order: i64, sparse: bool) -> StreamRef<Q> {
        let coefficients = coefficients.to_vec();
        FunctionStream::new(
            move |n| {
                usize::try_from(n - order)
                    .ok()
                    .and_then(|i| coefficients.get(i))
                    .map_or_else(Q::zero, |&c| q(c))
            },
            sparse,
            order,
        )
        .into_ref()
    }

    fn values(s: &dyn Stream<Q>) -> Vec<Q> {
        RANGE.map(|n| s.get(n).unwrap()).collect()
    }

    proptest! {
        #[test]
        fn exact_canonical_form_is_idempotent(
            initial in prop::collection::vec(-3i64..3, 0..5),
            constant in -2i64..2,
            order in -5i64..5,
        ) {
            let built = ExactStream::new(initial.into_iter().map(q).collect(), q(constant), None, order);
            prop_assume!(built.is_ok());
            let s = built.unwrap();

            let start = s.valuation() - 2;
            let padded: Vec<Q> = (start..s.degree() + 5).map(|n| s.coefficient(n)).collect();
            let rebuilt = ExactStream::new(padded, s.constant().clone(), None, start).unwrap();
            prop_assert!(crate::same_stream::<Q>(&rebuilt, &s));
            prop_assert_eq!(rebuilt, s);
        }

        #[test]
        fn sum_and_difference_are_pointwise(
            (a, va) in laurent_part(),
            (b, vb) in laurent_part(),
            sparse in any::<bool>(),
        ) {
            let x = lazy(&a, va, sparse);
            let y = lazy(&b, vb, sparse);
            let sum = AddStream::new(x.clone(), y.clone(), sparse);
            let difference = SubStream::new(x.clone(), y.clone(), sparse);
            for n in RANGE {
                let (xn, yn) = (x.get(n).unwrap(), y.get(n).unwrap());
                prop_assert_eq!(sum.get(n).unwrap(), xn.clone() + yn.clone());
                prop_assert_eq!(difference.get(n).unwrap(), xn - yn);
            }
        }

        #[test]
        fn cauchy_product_is_commutative(
            (a, va) in laurent_part(),
            (b, vb) in laurent_part(),
        ) {
            let x = lazy(&a, va, true);
            let y = lazy(&b, vb, false);
            let xy = CauchyMulStream::commutative(x.clone(), y.clone(), true);
            let yx = CauchyMulStream::commutative(y, x, false);
            prop_assert_eq!(values(&xy), values(&yx));
        }

        #[test]
        fn cauchy_product_is_associative(
            (a, va) in laurent_part(),
            (b, vb) in laurent_part(),
            (c, vc) in laurent_part(),
        ) {
            let (x, y, z) = (lazy(&a, va, true), lazy(&b, vb, true), lazy(&c, vc, true));
            let left = CauchyMulStream::new(CauchyMulStream::new(x.clone(), y.clone(), true).into_ref(), z.clone(), true);
            let right = CauchyMulStream::new(x, CauchyMulStream::new(y, z, true).into_ref(), true);
            prop_assert_eq!(values(&left), values(&right));
        }

        #[test]
        fn cauchy_inverse_is_an_inverse((a, va) in laurent_part()) {
            let g = lazy(&a, va, true);
            let inverse = CauchyInverseStream::new(g.clone()).into_ref();
            let product = CauchyMulStream::new(g, inverse, false);
            for n in RANGE {
                let expected = if n == 0 { Q::one() } else { Q::zero() };
                prop_assert_eq!(product.get(n).unwrap(), expected);
            }
        }

        #[test]
        fn shift_round_trips((a, va) in laurent_part(), k in -8i64..8) {
            let s = lazy(&a, va, true);
            let there = Arc::new(ShiftStream::new(s.clone(), k));
            let back = ShiftStream::new(there, -k);
            prop_assert_eq!(values(&back), values(s.as_ref()));
        }

        #[test]
        fn sparse_and_dense_agree((a, va) in laurent_part(), (b, vb) in laurent_part()) {
            let build = |sparse: bool| {
                let x = lazy(&a, va, sparse);
                let y = lazy(&b, vb, sparse);
                let product = CauchyMulStream::new(x.clone(), y, sparse).into_ref();
                AddStream::new(product, x, sparse)
            };
            prop_assert_eq!(values(&build(true)), values(&build(false)));
        }

        #[test]
        fn approximate_order_only_increases(
            (a, va) in laurent_part(),
            zeros in 0usize..4,
            reads in prop::collection::vec(-6i64..14, 1..10),
            sparse in any::<bool>(),
        ) {
            let mut padded = vec![0; zeros];
            padded.extend(a);
            let s = lazy(&padded, va, sparse);
            let mut last = s.approximate_order().unwrap();
            for n in reads {
                s.get(n).unwrap();
                let now = s.approximate_order().unwrap();
                prop_assert!(now >= last);
                last = now;
            }
            prop_assert!(last <= s.order().unwrap());
        }

        #[test]
        fn infinite_product_matches_finite_product(
            factors in prop::collection::vec(prop::collection::vec(-3i64..3, 1..4), 1..5),
        ) {
            // Factor i starts at index i + 1, so orders increase strictly.
            let terms: Vec<StreamRef<Q>> = factors
                .iter()
                .zip(1..)
                .map(|(cs, order)| lazy(cs, order, true))
                .collect();
            let infinite = InfiniteProduct::new(terms.clone().into_iter(), true);

            let one: StreamRef<Q> = Arc::new(ExactStream::monomial(Q::one(), 0).unwrap());
            let mut finite = one.clone();
            for term in terms {
                let factor = AddStream::new(one.clone(), term, true).into_ref();
                finite = CauchyMulStream::new(finite, factor, true).into_ref();
            }
            prop_assert_eq!(values(&infinite), values(finite.as_ref()));
            prop_assert_eq!(infinite.committed_order(), Some(Valuation::Infinity));
        }

        #[test]
        fn advance_agrees_with_finite_products(
            pattern in prop::collection::vec(-3i64..3, 1..4).prop_filter("leading term must be nonzero", |cs| cs[0] != 0),
            steps in 1i64..6,
            sparse in any::<bool>(),
        ) {
            // Term i is the pattern shifted to start at index i.
            let factors = pattern.clone();
            let infinite = InfiniteProduct::new((1i64..).map(move |order| lazy(&factors, order, sparse)), sparse);
            let mut committed = Valuation::Finite(i64::MIN);
            for _ in 0..steps {
                let next = infinite.advance().unwrap();
                prop_assert!(next > committed);
                committed = next;
            }
            prop_assert_eq!(committed, Valuation::Finite(steps + 1));

            let one: StreamRef<Q> = Arc::new(ExactStream::monomial(Q::one(), 0).unwrap());
            let mut finite = one.clone();
            for order in 1..=steps {
                let factor = AddStream::new(one.clone(), lazy(&pattern, order, sparse), sparse).into_ref();
                finite = CauchyMulStream::new(finite, factor, sparse).into_ref();
            }
            for n in -2..=steps {
                prop_assert_eq!(infinite.get(n).unwrap(), finite.get(n).unwrap());
            }
        }
    }
}
