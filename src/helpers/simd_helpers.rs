//! Dense f64 summation, AVX2-accelerated when the CPU supports it.

/// Sums a dense slice. Uses AVX2 on x86_64 when available, scalar otherwise.
#[cfg(target_arch = "x86_64")]
pub fn sum_f64(values: &[f64]) -> f64 {
    if is_x86_feature_detected!("avx2") {
        unsafe { sum_f64_avx2(values) }
    } else {
        values.iter().sum()
    }
}

#[cfg(not(target_arch = "x86_64"))]
pub fn sum_f64(values: &[f64]) -> f64 {
    values.iter().sum()
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn sum_f64_avx2(values: &[f64]) -> f64 {
    use std::arch::x86_64::{_mm256_add_pd, _mm256_loadu_pd, _mm256_setzero_pd, _mm256_storeu_pd};

    const LANES: usize = 4; // __m256d holds 4 f64s
    let mut sum = _mm256_setzero_pd();

    let chunks = values.chunks_exact(LANES);
    let remainder = chunks.remainder();

    for chunk in chunks {
        let v = unsafe { _mm256_loadu_pd(chunk.as_ptr()) };
        sum = _mm256_add_pd(sum, v);
    }

    // horizontal reduction
    let mut lanes = [0f64; LANES];
    unsafe { _mm256_storeu_pd(lanes.as_mut_ptr(), sum) };

    let mut total: f64 = lanes.iter().sum();
    for &v in remainder {
        total += v;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_match_scalar() {
        let values: Vec<f64> = (0..1003).map(|i| i as f64 * 0.5).collect();
        let scalar: f64 = values.iter().sum();
        assert!((sum_f64(&values) - scalar).abs() < 1e-6);
    }

    #[test]
    fn empty_slice_sums_to_zero() {
        assert_eq!(sum_f64(&[]), 0.0);
    }
}
