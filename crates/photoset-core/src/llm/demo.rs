//! Offline demo provider.
//!
//! Returns canned scene descriptions after a short simulated delay so the
//! full upload → generate → download flow can be exercised without an API key.

use super::provider::{ImageInput, VisionProvider};
use crate::error::UpstreamError;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::time::Duration;

const DESCRIPTIONS: [&str; 5] = [
    "这张图片展示了一个宁静的自然场景，画面中可以看到蓝天白云和绿色的植被。光线柔和，整体氛围宁静祥和。",
    "图片中呈现了一个现代化的城市景观，高楼大厦林立，玻璃幕墙反射着天空的光芒。画面构图对称，色彩鲜明。",
    "这是一张人物肖像照片，主体人物表情自然，光线打在脸部形成柔和的阴影。背景虚化，突出了主体。",
    "图片展示了精致的美食摆盘，色彩丰富，细节清晰。光线从侧面照射，营造出诱人的视觉效果。",
    "这张照片拍摄了一个温馨的室内场景，家具摆放整洁，装饰简约现代。自然光透过窗户洒进室内。",
];

const DETAIL_SUFFIX: &str = " 画面细节丰富，值得细细品味。";
const MOOD_SUFFIX: &str = " 整体情感表达真挚，氛围营造出色。";

/// Provider that never touches the network.
pub struct DemoProvider {
    delay: Duration,
}

impl DemoProvider {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
        }
    }
}

/// Decorate a base description according to keywords in the system prompt.
fn embellish(base: &str, system_prompt: &str) -> String {
    let mut description = base.to_string();
    if system_prompt.contains("详细") {
        description.push_str(DETAIL_SUFFIX);
    }
    if system_prompt.contains("情感") || system_prompt.contains("氛围") {
        description.push_str(MOOD_SUFFIX);
    }
    description
}

#[async_trait]
impl VisionProvider for DemoProvider {
    fn name(&self) -> &str {
        "demo"
    }

    async fn describe(
        &self,
        _image: &ImageInput,
        system_prompt: &str,
        _temperature: f32,
    ) -> Result<String, UpstreamError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        // ThreadRng is !Send; keep it out of scope across the await above.
        let base = DESCRIPTIONS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(DESCRIPTIONS[0]);
        Ok(embellish(base, system_prompt))
    }
}
