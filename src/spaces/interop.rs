//! Optional conversions between observations/spaces and ndarray types.
//!
//! Gated behind the `ndarray` feature; the core crate keeps flat `Vec`s.

#[cfg(feature = "ndarray")]
pub mod ndarray_impl {
    use ndarray::{Array1, Array2, ArrayD, IxDyn};

    use crate::core::{GymError, Result};
    use crate::sim::Observation;
    use crate::spaces::BoxSpace;

    impl<T: Copy + PartialOrd> BoxSpace<T> {
        /// Lower bounds shaped like the space.
        pub fn low_array(&self) -> Result<ArrayD<T>> {
            ArrayD::from_shape_vec(IxDyn(self.shape()), self.low().to_vec())
                .map_err(|e| GymError::Other(e.to_string()))
        }

        /// Upper bounds shaped like the space.
        pub fn high_array(&self) -> Result<ArrayD<T>> {
            ArrayD::from_shape_vec(IxDyn(self.shape()), self.high().to_vec())
                .map_err(|e| GymError::Other(e.to_string()))
        }
    }

    impl Observation {
        /// Positions as a flat vector; `None` for image observations.
        pub fn positions_array(&self) -> Option<Array1<f32>> {
            self.as_positions().map(|v| Array1::from_vec(v.to_vec()))
        }

        /// Image as a `(width, height)` array indexed `[x, y]`.
        pub fn image_array(&self) -> Result<Array2<u8>> {
            match self {
                Observation::Image { width, height, data } => {
                    Array2::from_shape_vec((*width as usize, *height as usize), data.clone())
                        .map_err(|e| GymError::InvalidObservation(e.to_string()))
                }
                Observation::Positions(_) => {
                    Err(GymError::InvalidObservation("not an image observation".into()))
                }
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn image_array_is_indexed_by_x_then_y() {
            let obs = Observation::Image { width: 2, height: 3, data: vec![0, 1, 2, 10, 11, 12] };
            let arr = obs.image_array().unwrap();
            assert_eq!(arr.shape(), &[2, 3]);
            assert_eq!(arr[[1, 2]], 12);
            assert!(obs.positions_array().is_none());
        }

        #[test]
        fn bounds_arrays_follow_shape() {
            let b = BoxSpace::uniform(0u8, 255u8, &[4, 2]);
            assert_eq!(b.low_array().unwrap().shape(), &[4, 2]);
            assert_eq!(b.high_array().unwrap()[[3, 1]], 255);
        }
    }
}
