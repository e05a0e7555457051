/// Example program that drives the pose bridge through its method channel
/// Run with: cargo run --example pose_bridge

use pose_bridge_lib::core::frame_decoder;
use pose_bridge_lib::{attach, BridgeConfig, MethodCall, MethodResponse};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;

fn print_response(label: &str, response: &MethodResponse) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}:", label);
    println!("{}", serde_json::to_string_pretty(response)?);
    println!();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Pose Bridge Demo ===\n");

    let config = BridgeConfig::load()?;
    println!("Channel: {}", config.channel_name);
    println!("Model cache: {}\n", config.model_dir.display());

    let (channel, server) = attach(&config)?;

    let init = channel
        .invoke(
            MethodCall::new("initialize")
                .with_arg("minDetectionConfidence", 0.6)
                .with_arg("minTrackingConfidence", 0.6),
        )
        .await?;
    print_response("initialize", &init)?;

    // Mid-grey frame: luma and chroma all at 128
    let len = frame_decoder::required_len(WIDTH, HEIGHT).ok_or("frame too large")?;
    let frame = MethodCall::new("processImage")
        .with_arg("imageData", vec![128u8; len])
        .with_arg("width", WIDTH as i64)
        .with_arg("height", HEIGHT as i64)
        .with_arg("rotation", 0i64);
    let processed = channel.invoke(frame).await?;
    print_response("processImage", &processed)?;

    let disposed = channel.invoke(MethodCall::new("dispose")).await?;
    print_response("dispose", &disposed)?;

    drop(channel);
    server.await?;
    println!("✓ Channel detached");

    Ok(())
}
