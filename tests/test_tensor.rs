// Tests for shapes, tensors and parameter sets.

use num_complex::Complex64;
use occam::tensor::{Element, Init, ParameterSet, Shape, Tensor};
use occam::utils::SeededRng;
use occam::Error;

// ============================================================================
// Shape and Tensor Tests
// ============================================================================

mod tensor_tests {
    use super::*;

    #[test]
    fn test_shape_len_and_transpose() {
        let shape = Shape::new(4, 3);
        assert_eq!(shape.len(), 12);
        assert_eq!(shape.transposed(), Shape::new(3, 4));
        assert_eq!(Shape::scalar().len(), 1);
        assert_eq!(shape.to_string(), "[4, 3]");
    }

    #[test]
    fn test_from_values_checks_length() {
        let ok = Tensor::from_values("t", Shape::new(2, 2), vec![1.0f32, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(ok.row(1), &[3.0, 4.0]);
        assert_eq!(ok.gradient, vec![0.0; 4]);

        assert!(Tensor::from_values("t", Shape::new(2, 2), vec![1.0f32]).is_err());
    }

    #[test]
    fn test_empty_dimension_rejected() {
        assert!(matches!(
            Tensor::<f64>::zeros("t", Shape::new(0, 3)),
            Err(Error::EmptyShape { .. })
        ));
    }

    #[test]
    fn test_assign_converts_into_element_type() {
        let mut t = Tensor::<Complex64>::zeros("t", Shape::new(2, 1)).unwrap();
        t.assign(&[1.5, -2.0]).unwrap();
        assert_eq!(t.values, vec![Complex64::new(1.5, 0.0), Complex64::new(-2.0, 0.0)]);
        assert!(t.assign(&[1.0]).is_err());
    }
}

// ============================================================================
// Element Tests
// ============================================================================

mod element_tests {
    use super::*;

    #[test]
    fn test_report_is_magnitude_for_complex() {
        assert_eq!(Complex64::new(3.0, 4.0).report(), 5.0);
        assert_eq!((-2.0f64).report(), -2.0);
    }

    #[test]
    fn test_dot_rows_backward_accumulates() {
        // out[j] = a.row(j) · b with a: 2 rows of width 2, b: one row.
        let a = [1.0f64, 2.0, 3.0, 4.0];
        let b = [0.5f64, -1.0];
        let grad = [1.0f64, 2.0];
        let mut grad_a = [0.0f64; 4];
        let mut grad_b = [0.0f64; 2];
        f64::dot_rows_backward(&a, &b, 2, &grad, &mut grad_a, &mut grad_b);

        assert_eq!(grad_a, [0.5, -1.0, 1.0, -2.0]);
        assert_eq!(grad_b, [7.0, 10.0]);
    }
}

// ============================================================================
// Parameter Set Tests
// ============================================================================

mod parameter_set_tests {
    use super::*;

    #[test]
    fn test_lookup_by_name() {
        let mut set = ParameterSet::<f32>::new();
        let points = set.add("points", Shape::new(4, 8)).unwrap();
        assert_eq!(set.id("points").unwrap(), points);
        assert!(matches!(set.id("nope"), Err(Error::UnknownParameter(_))));
        assert_eq!(set.by_name("points").unwrap().len(), 32);
    }

    #[test]
    fn test_initialize_is_reproducible() {
        let build = |seed| {
            let mut set = ParameterSet::<f64>::new();
            set.add("points", Shape::new(4, 8)).unwrap();
            set.initialize(Init::Kaiming, &mut SeededRng::new(seed));
            set.by_name("points").unwrap().values.clone()
        };
        assert_eq!(build(3), build(3));
        assert_ne!(build(3), build(4));
    }

    #[test]
    fn test_inputs_skipped_by_initialize() {
        let mut set = ParameterSet::<f64>::new();
        let x = set.add_input("input", Shape::new(4, 1)).unwrap();
        set.initialize(Init::Uniform, &mut SeededRng::new(1));
        assert_eq!(set.get(x).values, vec![0.0; 4]);

        set.initialize_entry(x, Init::Uniform, &mut SeededRng::new(1));
        assert!(set.get(x).values.iter().any(|&v| v != 0.0));
    }

    #[test]
    fn test_gradients_finite() {
        let mut set = ParameterSet::<f32>::new();
        let w = set.add("w", Shape::new(2, 1)).unwrap();
        assert!(set.gradients_finite());
        set.get_mut(w).gradient[1] = f32::INFINITY;
        assert!(!set.gradients_finite());
    }
}
