use common::{JudgeBackend, JudgeConfig};
use newsjudge::claims::ClaimExtractor;
use newsjudge::judge::{build_judge, Judge};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let backend = match std::env::var("JUDGE_BACKEND").as_deref() {
        Ok("gemini") => JudgeBackend::Gemini,
        _ => JudgeBackend::Openai,
    };

    let config = JudgeConfig {
        name: "smoke-test".to_string(),
        backend,
        api_url: std::env::var("JUDGE_API_URL").ok(),
        api_key_env: None,
        model: std::env::var("JUDGE_MODEL").ok(),
        timeout_seconds: Some(60),
        max_tokens: Some(800),
        temperature: Some(0.3),
    };

    let api_key_env = config.api_key_env_or_default().to_string();
    let api_key = match std::env::var(&api_key_env) {
        Ok(key) => key,
        Err(_) => {
            eprintln!("Set {} to run the smoke test", api_key_env);
            std::process::exit(1);
        }
    };

    println!("\n{}", "=".repeat(60));
    println!("Testing judge");
    println!("Backend: {:?}", config.backend);
    println!("Endpoint: {}", config.api_url_or_default());
    println!("Model: {}", config.model.as_deref().unwrap_or("(default)"));
    println!("{}", "=".repeat(60));

    let judge = build_judge(&config, api_key);

    let test_article = r#"
SHOCKING: City council SLASHES library budget in outrageous late-night vote!
The council voted 5 to 4 on Tuesday to reduce the library budget by 12 percent.
Residents are furious and say the decision will devastate the community.
The mayor said the cut was needed to close a 3 million dollar deficit.
    "#;

    // Test 1: Neutralization
    println!("\n[Test 1] Neutralizing article...");
    let neutral = match judge.neutralize(test_article).await {
        Ok(text) => {
            println!("✓ Success!");
            println!("{}", text);
            text
        }
        Err(e) => {
            eprintln!("✗ Failed: {}", e);
            test_article.to_string()
        }
    };

    // Test 2: Verification of extracted claims
    let claims = ClaimExtractor::default().extract(&neutral);
    println!("\n[Test 2] Verifying {} claims...", claims.len());
    for (i, claim) in claims.iter().enumerate() {
        let verdict = judge.verify(claim).await;
        println!("  {}. {:?} <- {}", i + 1, verdict, claim);
    }

    println!("\n{}", "=".repeat(60));
    println!("Tests completed");
    println!("{}", "=".repeat(60));
}
