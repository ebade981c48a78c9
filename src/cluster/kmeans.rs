/// Fixed-iteration k-means over 3-component points. Runs exactly `iters`
/// rounds with no convergence check, so identical input always produces
/// identical output.
pub struct KMeansResult {
    pub labels: Vec<usize>,
    pub centroids: Vec<[f64; 3]>,
}

pub fn k_means(points: &[[f64; 3]], k: usize, iters: usize) -> KMeansResult {
    let n = points.len();
    if n == 0 {
        return KMeansResult {
            labels: Vec::new(),
            centroids: Vec::new(),
        };
    }

    let k = k.clamp(1, n);

    // Deterministic seeding: evenly spaced source points.
    let step = n as f64 / k as f64;
    let mut centroids: Vec<[f64; 3]> = (0..k)
        .map(|i| points[(i as f64 * step).floor() as usize])
        .collect();

    let mut labels = vec![0usize; n];

    for _ in 0..iters {
        for (i, p) in points.iter().enumerate() {
            let mut best = 0;
            let mut best_d = f64::INFINITY;
            for (c, centroid) in centroids.iter().enumerate() {
                let d = sq_dist(p, centroid);
                if d < best_d {
                    best_d = d;
                    best = c;
                }
            }
            labels[i] = best;
        }

        let mut sums = vec![[0.0f64; 3]; k];
        let mut counts = vec![0usize; k];
        for (i, p) in points.iter().enumerate() {
            let c = labels[i];
            sums[c][0] += p[0];
            sums[c][1] += p[1];
            sums[c][2] += p[2];
            counts[c] += 1;
        }
        for c in 0..k {
            // An emptied partition keeps its previous centroid; reseeding or
            // averaging zero members would oscillate or produce NaN.
            if counts[c] > 0 {
                let n = counts[c] as f64;
                centroids[c] = [sums[c][0] / n, sums[c][1] / n, sums[c][2] / n];
            }
        }
    }

    KMeansResult { labels, centroids }
}

fn sq_dist(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}
