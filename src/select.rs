// select.rs - 随机选图模块
// 从候选图片中无放回地随机抽取，数量与目标屏幕数一致

use crate::error::AppError;
use crate::setter::Screen;
use rand::Rng;
use rand::seq::SliceRandom;
use std::path::PathBuf;

/// 从候选中随机抽取 count 个互不相同的元素
pub fn sample<T: Clone>(candidates: &[T], count: usize) -> Result<Vec<T>, AppError> {
    sample_with(&mut rand::thread_rng(), candidates, count)
}

/// 同 `sample`，随机数生成器由调用方提供
pub fn sample_with<T: Clone, R: Rng + ?Sized>(
    rng: &mut R,
    candidates: &[T],
    count: usize,
) -> Result<Vec<T>, AppError> {
    if candidates.len() < count {
        return Err(AppError::InsufficientCandidates {
            available: candidates.len(),
            requested: count,
            unmet: Vec::new(),
        });
    }

    Ok(candidates.choose_multiple(rng, count).cloned().collect())
}

/// 为每个屏幕抽一个候选，数量不足时报告哪些屏幕没有图片
pub fn sample_for_screens<T: Clone>(candidates: &[T], screens: &[Screen]) -> Result<Vec<T>, AppError> {
    sample(candidates, screens.len()).map_err(|_| shortfall(candidates.len(), screens))
}

/// 按位置把图片分配给屏幕
///
/// 图片少于屏幕时返回 InsufficientCandidates，不会重复使用或凭空补图。
pub fn assign(images: Vec<PathBuf>, screens: &[Screen]) -> Result<Vec<(Screen, PathBuf)>, AppError> {
    if images.len() < screens.len() {
        return Err(shortfall(images.len(), screens));
    }

    Ok(screens.iter().copied().zip(images).collect())
}

fn shortfall(available: usize, screens: &[Screen]) -> AppError {
    AppError::InsufficientCandidates {
        available,
        requested: screens.len(),
        unmet: screens[available.min(screens.len())..].to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn test_sample_returns_distinct_elements() {
        let candidates: Vec<u32> = (0..10).collect();
        let mut rng = StdRng::seed_from_u64(7);
        for count in 0..=candidates.len() {
            let picked = sample_with(&mut rng, &candidates, count).unwrap();
            assert_eq!(picked.len(), count);
            let unique: HashSet<_> = picked.iter().collect();
            assert_eq!(unique.len(), count);
            assert!(picked.iter().all(|p| candidates.contains(p)));
        }
    }

    #[test]
    fn test_sample_too_few_candidates() {
        let err = sample(&["only"], 2).unwrap_err();
        assert!(matches!(
            err,
            AppError::InsufficientCandidates { available: 1, requested: 2, .. }
        ));
    }

    #[test]
    fn test_sample_for_screens_names_unmet() {
        let err = sample_for_screens(&["only"], &Screen::ALL).unwrap_err();
        assert_eq!(err.to_string(), "1 images for 2 screens, not set: screensaver");
    }

    #[test]
    fn test_assign_pairs_in_order() {
        let images = vec![PathBuf::from("/a.jpg"), PathBuf::from("/b.jpg")];
        let assigned = assign(images, &Screen::ALL).unwrap();
        assert_eq!(
            assigned,
            vec![
                (Screen::Background, PathBuf::from("/a.jpg")),
                (Screen::Screensaver, PathBuf::from("/b.jpg")),
            ]
        );
    }

    #[test]
    fn test_assign_reports_shortfall() {
        let err = assign(vec![PathBuf::from("/a.jpg")], &Screen::ALL).unwrap_err();
        let message = err.to_string();
        assert!(message.contains('1') && message.contains('2'));
        match err {
            AppError::InsufficientCandidates { available, requested, unmet } => {
                assert_eq!((available, requested), (1, 2));
                assert_eq!(unmet, vec![Screen::Screensaver]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
