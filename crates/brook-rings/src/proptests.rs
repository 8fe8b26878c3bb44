//! Property-based tests for the coefficient rings.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::{Field, ModRing, Partition, Polynomial, PowerSum, Ring, Q, Z};

    fn small_int() -> impl Strategy<Value = i64> {
        -1000i64..1000i64
    }

    fn non_zero_int() -> impl Strategy<Value = i64> {
        prop_oneof![(-1000i64..=-1i64), (1i64..=1000i64)]
    }

    fn small_rational() -> impl Strategy<Value = Q> {
        (small_int(), non_zero_int()).prop_map(|(n, d)| Q::new(n, d))
    }

    fn small_poly() -> impl Strategy<Value = Polynomial<Q>> {
        prop::collection::vec(-20i64..20, 0..5)
            .prop_map(|cs| Polynomial::new(cs.into_iter().map(Q::from_integer).collect()))
    }

    fn small_partition() -> impl Strategy<Value = Partition> {
        prop::collection::vec(1u32..5, 0..4).prop_map(Partition::new)
    }

    fn small_power_sum() -> impl Strategy<Value = PowerSum<Q>> {
        prop::collection::vec((small_partition(), -5i64..5), 0..4).prop_map(|terms| {
            PowerSum::from_terms(terms.into_iter().map(|(la, c)| (la, Q::from_integer(c))))
        })
    }

    proptest! {
        #[test]
        fn integer_mul_by_scalar_matches_mul(a in small_int(), n in small_int()) {
            let a = Z::new(a);
            prop_assert_eq!(a.mul_by_scalar(n), a * Z::new(n));
        }

        #[test]
        fn rational_inverse(a in small_rational()) {
            prop_assume!(!a.is_zero());
            let inv = a.inv().unwrap();
            prop_assert!((a * inv).is_one());
        }

        #[test]
        fn rational_distributive(a in small_rational(), b in small_rational(), c in small_rational()) {
            prop_assert_eq!(
                a.clone() * (b.clone() + c.clone()),
                a.clone() * b + a * c
            );
        }

        #[test]
        fn modular_matches_integers(a in small_int(), b in small_int()) {
            type Z12 = ModRing<12>;
            prop_assert_eq!(Z12::from_i64(a) * Z12::from_i64(b), Z12::from_i64(a * b));
            prop_assert_eq!(Z12::from_i64(a) - Z12::from_i64(b), Z12::from_i64(a - b));
        }

        #[test]
        fn polynomial_mul_commutative(a in small_poly(), b in small_poly()) {
            prop_assert_eq!(a.clone() * b.clone(), b * a);
        }

        #[test]
        fn polynomial_eval_is_homomorphism(a in small_poly(), b in small_poly(), x in small_rational()) {
            prop_assert_eq!((a.clone() * b.clone()).eval(&x), a.eval(&x) * b.eval(&x));
        }

        #[test]
        fn partition_union_adds_sizes(a in small_partition(), b in small_partition()) {
            let u = a.union(&b);
            prop_assert_eq!(u.size(), a.size() + b.size());
            prop_assert_eq!(u.len(), a.len() + b.len());
            prop_assert_eq!(Partition::from_exp(&u.to_exp()), u);
        }

        #[test]
        fn power_sum_associative(a in small_power_sum(), b in small_power_sum(), c in small_power_sum()) {
            prop_assert_eq!(
                (a.clone() * b.clone()) * c.clone(),
                a * (b * c)
            );
        }

        #[test]
        fn power_sum_stretch_is_multiplicative(a in small_power_sum(), b in small_power_sum(), k in 1u32..4) {
            prop_assert_eq!(
                (a.clone() * b.clone()).stretch(k, &[]),
                a.stretch(k, &[]) * b.stretch(k, &[])
            );
        }
    }
}
