use blend_ngin::{config::WindowConfig, flow, scene::DemoScene};

fn main() -> anyhow::Result<()> {
    flow::run(WindowConfig::default(), DemoScene::constructor())
}
