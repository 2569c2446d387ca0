use rayon::{
    iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator},
    slice::ParallelSliceMut,
};

/// Precomputed mapping from window pixels to framebuffer pixels
pub struct ScaleLut {
    dst_w: usize,
    dst_h: usize,
    src_x: Vec<usize>,
    src_row: Vec<usize>, // row offset into the source buffer
}

impl ScaleLut {
    pub fn empty() -> Self {
        Self {
            dst_w: 0,
            dst_h: 0,
            src_x: Vec::new(),
            src_row: Vec::new(),
        }
    }

    #[inline]
    pub fn matches(&self, dst_w: usize, dst_h: usize) -> bool {
        self.dst_w == dst_w && self.dst_h == dst_h
    }
}

#[inline]
fn nearest(dst: usize, dst_len: usize, src_len: usize) -> usize {
    // sample at pixel centres
    let s = ((dst as f32 + 0.5) * src_len as f32 / dst_len as f32) as usize;
    s.min(src_len - 1)
}

pub fn build_scale_lut(dst_w: usize, dst_h: usize, src_w: usize, src_h: usize) -> ScaleLut {
    if src_w == 0 || src_h == 0 {
        return ScaleLut::empty();
    }
    let src_x = (0..dst_w).map(|x| nearest(x, dst_w, src_w)).collect();
    let src_row = (0..dst_h)
        .map(|y| nearest(y, dst_h, src_h) * src_w)
        .collect();
    ScaleLut {
        dst_w,
        dst_h,
        src_x,
        src_row,
    }
}

/// Parallel nearest-neighbour stretch
/// Rows are processed in parallel for cache friendly writes
pub fn blit_nearest_stretch(dst: &mut [u32], dw: usize, src: &[u32], lut: &ScaleLut) {
    if dw == 0 {
        return;
    }
    dst.par_chunks_mut(dw)
        .zip(lut.src_row.par_iter())
        .for_each(|(dst_row, &row)| {
            let src_row = &src[row..];
            for (d, &sx) in dst_row.iter_mut().zip(&lut.src_x) {
                *d = src_row[sx];
            }
        });
}
