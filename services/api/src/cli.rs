use crate::server;
use clap::{Args, Parser, Subcommand};
use followup_health::drivers::top_drivers;
use followup_health::error::AppError;
use followup_health::scoring::{
    calculate_results, AfterHoursCoverage, CalculatorInputs, FollowUpDepth, PatientValue,
    ResponseTime,
};

#[derive(Parser, Debug)]
#[command(
    name = "Follow-Up Health Dashboard",
    about = "Run the Follow-Up Health calculator service or score a clinic from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score one set of calculator inputs and print the report
    Score(ScoreArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// New patient inquiries per month (practical range 25-400)
    #[arg(long)]
    monthly_inquiries: u32,
    /// Typical first-response time: under5, 5-30, 30-2h, sameday, nextday
    #[arg(long, value_parser = parse_response_time)]
    response_time: ResponseTime,
    /// Follow-up touches per inquiry: 4-6, 2-3, 1, notsure
    #[arg(long, value_parser = parse_follow_up_depth)]
    follow_up_depth: FollowUpDepth,
    /// Average patient value bracket: under250, 250-500, 500-1000, 1000+
    #[arg(long, value_parser = parse_patient_value)]
    patient_value: PatientValue,
    /// After-hours coverage: yes, sometimes, no
    #[arg(long, value_parser = parse_after_hours)]
    after_hours: AfterHoursCoverage,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => {
            run_score(args);
            Ok(())
        }
    }
}

fn run_score(args: ScoreArgs) {
    let inputs = CalculatorInputs {
        monthly_inquiries: args.monthly_inquiries,
        response_time: args.response_time,
        follow_up_depth: args.follow_up_depth,
        patient_value: args.patient_value,
        after_hours: args.after_hours,
    };

    let results = calculate_results(&inputs);
    let drivers = top_drivers(&inputs);

    println!("Follow-Up Health report");
    println!(
        "Inputs: {} inquiries/month | {} | {} | {} | after-hours: {}",
        inputs.monthly_inquiries,
        inputs.response_time.label(),
        inputs.follow_up_depth.label(),
        inputs.patient_value.label(),
        inputs.after_hours.label()
    );

    println!(
        "\nGrade: {} ({}/100) - {}",
        results.grade, results.grade_score, results.severity
    );
    println!(
        "Estimated drop-off: {}% of inquiries",
        results.dropoff_percent
    );
    println!(
        "Monthly revenue at risk: ${} - ${}",
        results.revenue_at_risk.low, results.revenue_at_risk.high
    );

    println!("\nComponent scores");
    println!("- Speed: {}/100", results.scores.speed);
    println!("- Persistence: {}/100", results.scores.persistence);
    println!("- Coverage: {}/100", results.scores.coverage);

    println!("\nLeakage drivers");
    for driver in drivers {
        println!("- {}: {}", driver.title, driver.description);
    }
}

fn parse_response_time(raw: &str) -> Result<ResponseTime, String> {
    match raw.trim() {
        "under5" => Ok(ResponseTime::Under5Min),
        "5-30" => Ok(ResponseTime::Within30Min),
        "30-2h" => Ok(ResponseTime::WithinTwoHours),
        "sameday" => Ok(ResponseTime::SameDay),
        "nextday" => Ok(ResponseTime::NextDay),
        other => Err(format!(
            "unknown response time '{other}' (expected under5, 5-30, 30-2h, sameday, or nextday)"
        )),
    }
}

fn parse_follow_up_depth(raw: &str) -> Result<FollowUpDepth, String> {
    match raw.trim() {
        "4-6" => Ok(FollowUpDepth::FourToSix),
        "2-3" => Ok(FollowUpDepth::TwoToThree),
        "1" => Ok(FollowUpDepth::One),
        "notsure" => Ok(FollowUpDepth::NotSure),
        other => Err(format!(
            "unknown follow-up depth '{other}' (expected 4-6, 2-3, 1, or notsure)"
        )),
    }
}

fn parse_patient_value(raw: &str) -> Result<PatientValue, String> {
    match raw.trim() {
        "under250" => Ok(PatientValue::Under250),
        "250-500" => Ok(PatientValue::From250To500),
        "500-1000" => Ok(PatientValue::From500To1000),
        "1000+" => Ok(PatientValue::Over1000),
        other => Err(format!(
            "unknown patient value '{other}' (expected under250, 250-500, 500-1000, or 1000+)"
        )),
    }
}

fn parse_after_hours(raw: &str) -> Result<AfterHoursCoverage, String> {
    match raw.trim() {
        "yes" => Ok(AfterHoursCoverage::Yes),
        "sometimes" => Ok(AfterHoursCoverage::Sometimes),
        "no" => Ok(AfterHoursCoverage::No),
        other => Err(format!(
            "unknown after-hours coverage '{other}' (expected yes, sometimes, or no)"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_tokens() {
        assert_eq!(parse_response_time("5-30"), Ok(ResponseTime::Within30Min));
        assert_eq!(parse_follow_up_depth("notsure"), Ok(FollowUpDepth::NotSure));
        assert_eq!(parse_patient_value("1000+"), Ok(PatientValue::Over1000));
        assert_eq!(parse_after_hours("sometimes"), Ok(AfterHoursCoverage::Sometimes));
    }

    #[test]
    fn rejects_unknown_tokens() {
        assert!(parse_response_time("instant").is_err());
        assert!(parse_follow_up_depth("7").is_err());
        assert!(parse_patient_value("priceless").is_err());
        assert!(parse_after_hours("maybe").is_err());
    }
}
