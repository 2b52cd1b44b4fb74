//! Evaluation binary: compares retrieval approaches and prompt templates,
//! and runs the end-to-end system evaluation
//!
//! Run with: cargo run -p scholar-rag --bin scholar-rag-eval -- --all

use clap::Parser;
use scholar_rag::config::RagConfig;
use scholar_rag::evaluation::{
    save_report, PromptEvaluator, RetrievalEvaluator, SystemEvaluator,
};
use scholar_rag::pipeline::RagPipeline;
use scholar_rag::providers::VectorStoreProvider;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "scholar-rag-eval", about = "RAG evaluation harness")]
struct Args {
    /// Compare retrieval approaches (similarity k=3/5/10, MMR k=5)
    #[arg(long)]
    retrieval: bool,

    /// Compare prompt templates
    #[arg(long)]
    prompts: bool,

    /// Run the end-to-end system evaluation
    #[arg(long)]
    system: bool,

    /// Run everything
    #[arg(long)]
    all: bool,

    /// Optional JSON file with system evaluation questions
    #[arg(long)]
    questions: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scholar_rag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let run_retrieval = args.all || args.retrieval;
    let run_prompts = args.all || args.prompts;
    let run_system = args.all || args.system;

    if !(run_retrieval || run_prompts || run_system) {
        anyhow::bail!("Nothing to do: pass --retrieval, --prompts, --system, or --all");
    }

    let config = RagConfig::from_env();
    config.validate()?;

    let pipeline = RagPipeline::from_config(config)?;

    // The evaluations query an existing index
    let chunk_count = pipeline.store().count().await?;
    if chunk_count == 0 {
        anyhow::bail!(
            "Vector collection is empty. Start the server once (or ingest documents) first."
        );
    }
    tracing::info!("Evaluating against {} indexed chunks", chunk_count);

    if run_retrieval {
        println!("{}", "=".repeat(70));
        println!("RETRIEVAL EVALUATION - Multiple Approaches Comparison");
        println!("{}", "=".repeat(70));

        let report = RetrievalEvaluator::new(&pipeline).run().await?;

        for approach in &report.approaches {
            println!(
                "\n{}:\n  Precision: {:.2}%\n  Keyword Score: {:.2}\n  Combined Score: {:.4}",
                approach.name,
                approach.overall_metrics.overall_precision * 100.0,
                approach.overall_metrics.avg_keyword_score,
                approach.combined_score
            );
        }
        println!(
            "\nBest Approach: {} (score {:.4})",
            report.best_approach, report.best_score
        );

        save_report(&report, "retrieval_evaluation_results.json")?;
    }

    if run_prompts {
        println!("\n{}", "=".repeat(70));
        println!("LLM EVALUATION - Multiple Prompt Templates Comparison");
        println!("{}", "=".repeat(70));

        let report = PromptEvaluator::new(&pipeline).run().await?;

        for prompt in &report.prompt_evaluations {
            println!(
                "\n{}:\n  Average Quality Score: {:.2}/10\n  Average Word Count: {:.1}",
                prompt.prompt_name,
                prompt.overall_metrics.average_quality_score,
                prompt.overall_metrics.average_word_count
            );
        }
        println!(
            "\nBest Prompt: {} ({:.2}/10)",
            report.best_prompt, report.best_score
        );

        save_report(&report, "llm_evaluation_results.json")?;
    }

    if run_system {
        println!("\n{}", "=".repeat(70));
        println!("SYSTEM EVALUATION - End-to-End Quality");
        println!("{}", "=".repeat(70));

        let mut evaluator = SystemEvaluator::new(&pipeline);
        if let Some(path) = &args.questions {
            evaluator = evaluator.with_questions_file(path);
        }

        let report = evaluator.run().await?;

        println!(
            "\nQuestions: {} ({} successful, {} with sources)",
            report.summary.total_questions,
            report.summary.successful_queries,
            report.summary.questions_with_sources
        );
        println!(
            "Avg keyword score: {:.2}  Avg quality: {:.2}  Avg response time: {:.2}s",
            report.summary.avg_keyword_score,
            report.summary.avg_quality,
            report.summary.avg_response_time_secs
        );
        for (category, summary) in &report.by_category {
            println!(
                "  {}: {} questions, keyword {:.2}, quality {:.2}",
                category, summary.questions, summary.avg_keyword_score, summary.avg_quality
            );
        }

        save_report(&report, "evaluation_results.json")?;
    }

    Ok(())
}
