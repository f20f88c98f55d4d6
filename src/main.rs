use chainfly_client::api;
use chainfly_client::bootstrap::{initialize_session, SessionCheck};
use chainfly_client::chainfly::types::RegisterRequest;
use chainfly_client::chainfly::ApiClient;
use chainfly_client::core::{AppConfig, AppError, AppState};
use chainfly_client::draft::{
    DocumentSet, FinancialInfo, LoanApplicationDraft, PersonalInfo, SolarSpecs,
};
use chainfly_client::finance::{
    amortization_schedule, roi_projection, round_to_paise, stamp_due_dates, write_schedule_csv,
    EmiBreakdown, EmiParameters, RoiInputs, SystemType, Tenure,
};
use chainfly_client::chainfly::types::DocumentType;
use chrono::NaiveDate;
use serde::Deserialize;
use std::str::FromStr;
use tracing_subscriber::{fmt, EnvFilter};

fn usage() -> &'static str {
    r#"Usage:
    chainfly emi <PRINCIPAL> <RATE_PERCENT> <YEARS> [--months]
    chainfly subsidy <KW> [--state STATE] [--commercial]
    chainfly schedule <PRINCIPAL> <RATE_PERCENT> <YEARS> [--periods N] [--start YYYY-MM-DD] [--csv PATH]
    chainfly roi <KW> <STATE> <INSTALLATION_COST> [--tariff RUPEES_PER_KWH]
    chainfly serve
    chainfly register <EMAIL> [PASSWORD] [--name NAME] [--phone PHONE]
    chainfly login <EMAIL> [PASSWORD]
    chainfly logout
    chainfly me
    chainfly status
    chainfly loans
    chainfly loan <LOAN_ID>
    chainfly report <LOAN_ID> <OUT.pdf>
    chainfly apply <APPLICATION.json> [--dry-run]

With --months, the third emi argument is a tenure in months.
PASSWORD falls back to CHAINFLY_PASSWORD.
APPLICATION.json holds the wizard sections: {"personal": {...}, "solar": {...},
"financial": {...}, "documents": {"aadhaar": "a.pdf", "pan": "p.pdf"}}.

Env:
    CHAINFLY_API_BASE_URL (or VITE_API_BASE_URL; default http://localhost:8000/api)
    CHAINFLY_HTTP_TIMEOUT_SECS (default 30; 0 disables)
    CHAINFLY_SESSION_FILE (default ~/.chainfly/session.json)
    CHAINFLY_SUBSIDY_RULES (JSON rule file; default PM Surya Ghar)
    SERVER_ADDR (serve; default 127.0.0.1:8080)
    LOG_FORMAT (json for structured logs)
    RUST_LOG
"#
}

fn fail(message: &str) -> ! {
    eprintln!("{message}\n\n{}", usage());
    std::process::exit(2);
}

fn required<T: FromStr>(value: Option<String>, name: &str) -> T {
    let Some(raw) = value else {
        fail(&format!("Missing {name}"));
    };
    raw.parse()
        .unwrap_or_else(|_| fail(&format!("Invalid {name}: {raw}")))
}

fn flag_value(args: &mut impl Iterator<Item = String>, flag: &str) -> String {
    args.next()
        .unwrap_or_else(|| fail(&format!("{flag} needs a value")))
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "chainfly=info,chainfly_client=info,tower_http=info".into());
    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        eprintln!("tracing init failed: {e}");
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing(config.log_json);

    let mut args = std::env::args().skip(1);
    let cmd = args.next().unwrap_or_else(|| fail("Missing command"));

    match cmd.as_str() {
        "emi" => run_emi(args)?,
        "subsidy" => run_subsidy(config, args)?,
        "schedule" => run_schedule(args)?,
        "roi" => run_roi(args)?,
        "serve" => run_server(config).await?,
        "register" | "login" | "logout" | "me" | "status" | "loans" | "loan" | "report"
        | "apply" => {
            let client = ApiClient::from_config(&config)?;
            let state = AppState::from_config(config)?;
            run_remote(&client, &state, &cmd, args).await?;
        }
        "help" | "--help" | "-h" => println!("{}", usage()),
        _ => fail(&format!("Unknown command: {cmd}")),
    }

    Ok(())
}

fn run_emi(mut args: impl Iterator<Item = String>) -> Result<(), AppError> {
    let principal: f64 = required(args.next(), "PRINCIPAL");
    let rate: f64 = required(args.next(), "RATE_PERCENT");
    let term: u32 = required(args.next(), "YEARS");
    let mut tenure = Tenure::Years(term);
    for a in args {
        match a.as_str() {
            "--months" => tenure = Tenure::Months(term),
            _ => fail(&format!("Unknown flag for emi: {a}")),
        }
    }

    let b = EmiBreakdown::compute(&EmiParameters::new(principal, rate, tenure))?;
    println!("Monthly EMI:     {:.0}", b.rounded_installment());
    println!("Exact EMI:       {:.2}", b.monthly_installment);
    println!("Tenure:          {} months", b.tenure_months);
    println!("Total payment:   {:.2}", round_to_paise(b.total_payment));
    println!("Total interest:  {:.2}", round_to_paise(b.total_interest));
    Ok(())
}

fn run_subsidy(config: AppConfig, mut args: impl Iterator<Item = String>) -> Result<(), AppError> {
    let kw: f64 = required(args.next(), "KW");
    let mut state = None;
    let mut system_type = SystemType::Residential;
    while let Some(a) = args.next() {
        match a.as_str() {
            "--state" => state = Some(flag_value(&mut args, "--state")),
            "--commercial" => system_type = SystemType::Commercial,
            _ => fail(&format!("Unknown flag for subsidy: {a}")),
        }
    }

    let app = AppState::from_config(config)?;
    let b = app.subsidy.breakdown(kw, state.as_deref(), system_type)?;
    println!("{}", serde_json::to_string_pretty(&b)?);
    Ok(())
}

fn run_schedule(mut args: impl Iterator<Item = String>) -> Result<(), AppError> {
    let principal: f64 = required(args.next(), "PRINCIPAL");
    let rate: f64 = required(args.next(), "RATE_PERCENT");
    let years: u32 = required(args.next(), "YEARS");
    let months = Tenure::Years(years).months()?;

    let mut periods = months;
    let mut start: Option<NaiveDate> = None;
    let mut csv_path = None;
    while let Some(a) = args.next() {
        match a.as_str() {
            "--periods" => periods = required(Some(flag_value(&mut args, "--periods")), "N"),
            "--start" => {
                start = Some(required(Some(flag_value(&mut args, "--start")), "YYYY-MM-DD"))
            }
            "--csv" => csv_path = Some(flag_value(&mut args, "--csv")),
            _ => fail(&format!("Unknown flag for schedule: {a}")),
        }
    }

    let b = EmiBreakdown::compute(&EmiParameters::new(principal, rate, Tenure::Months(months)))?;
    let emi = b.rounded_installment();
    let mut rows = amortization_schedule(principal, rate, emi, periods)?;
    if let Some(first_due) = start {
        stamp_due_dates(&mut rows, first_due);
    }

    match csv_path {
        Some(path) => {
            let file = std::fs::File::create(&path)?;
            write_schedule_csv(&rows, file)?;
            println!("Wrote {} rows to {path}", rows.len());
        }
        None => write_schedule_csv(&rows, std::io::stdout().lock())?,
    }
    Ok(())
}

fn run_roi(mut args: impl Iterator<Item = String>) -> Result<(), AppError> {
    let kw: f64 = required(args.next(), "KW");
    let location: String = required(args.next(), "STATE");
    let cost: f64 = required(args.next(), "INSTALLATION_COST");
    let mut inputs = RoiInputs::new(kw, location, cost);
    while let Some(a) = args.next() {
        match a.as_str() {
            "--tariff" => {
                inputs.electricity_rate =
                    required(Some(flag_value(&mut args, "--tariff")), "RUPEES_PER_KWH")
            }
            _ => fail(&format!("Unknown flag for roi: {a}")),
        }
    }

    let p = roi_projection(&inputs)?;
    println!("Irradiation:     {:.1} kWh/kW/day", p.irradiation);
    println!("Total savings:   {:.0}", p.total_savings);
    println!("Net savings:     {:.0}", p.net_savings);
    println!("ROI:             {:.1}%", p.roi_percentage);
    println!("Payback:         {} years", p.payback_period_years);
    println!("NPV @ 8%:        {:.0}", p.npv);
    Ok(())
}

async fn run_server(config: AppConfig) -> Result<(), AppError> {
    let addr: std::net::SocketAddr = config
        .server_addr
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid SERVER_ADDR: {e}")))?;
    let state = AppState::from_config(config)?;

    println!("Listening on http://{addr}");
    api::serve(state, addr, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

fn password(arg: Option<String>) -> Result<String, AppError> {
    match arg {
        Some(p) => Ok(p),
        None => std::env::var("CHAINFLY_PASSWORD")
            .map_err(|_| AppError::MissingEnv("CHAINFLY_PASSWORD")),
    }
}

async fn run_remote(
    client: &ApiClient,
    state: &AppState,
    cmd: &str,
    mut args: impl Iterator<Item = String>,
) -> Result<(), AppError> {
    match cmd {
        "register" => {
            let email: String = required(args.next(), "EMAIL");
            let mut password_arg = None;
            let mut full_name = None;
            let mut phone = None;
            while let Some(a) = args.next() {
                match a.as_str() {
                    "--name" => full_name = Some(flag_value(&mut args, "--name")),
                    "--phone" => phone = Some(flag_value(&mut args, "--phone")),
                    _ if password_arg.is_none() && !a.starts_with("--") => password_arg = Some(a.clone()),
                    _ => fail(&format!("Unknown flag for register: {a}")),
                }
            }
            let request = RegisterRequest {
                email,
                password: password(password_arg)?,
                full_name,
                phone,
            };
            let created = client.auth().register(&request).await?;
            println!("{}", serde_json::to_string_pretty(&created)?);
        }
        "login" => {
            let email: String = required(args.next(), "EMAIL");
            let password = password(args.next())?;
            client.auth().login(&email, &password).await?;
            println!("Signed in as {email}");
        }
        "logout" => {
            if let Err(e) = client.auth().logout().await {
                eprintln!("Backend logout failed ({e}); local session cleared.");
            } else {
                println!("Signed out");
            }
        }
        "me" => {
            let user = client.auth().me().await?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        "status" => match initialize_session(client).await {
            SessionCheck::SignedOut => println!("Not signed in"),
            SessionCheck::Valid { email } => println!("Signed in as {email}"),
            SessionCheck::Expired => println!("Session expired; signed out"),
            SessionCheck::Unverified { reason } => {
                println!("Signed in (could not verify: {reason})")
            }
        },
        "loans" => {
            let loans = client.loans().list().await?;
            println!("{}", serde_json::to_string_pretty(&loans)?);
        }
        "loan" => {
            let id: String = required(args.next(), "LOAN_ID");
            let loan = client.loans().get(&id).await?;
            println!("{}", serde_json::to_string_pretty(&loan)?);
        }
        "report" => {
            let id: String = required(args.next(), "LOAN_ID");
            let out: String = required(args.next(), "OUT.pdf");
            match client.reports().pdf(&id).await {
                Some(pdf) => {
                    std::fs::write(&out, &pdf)?;
                    println!("Saved {} bytes to {out}", pdf.len());
                }
                None => {
                    eprintln!("Report for loan {id} is not available");
                    std::process::exit(1);
                }
            }
        }
        "apply" => {
            let path: String = required(args.next(), "APPLICATION.json");
            let dry_run = match args.next().as_deref() {
                None => false,
                Some("--dry-run") => true,
                Some(other) => fail(&format!("Unknown flag for apply: {other}")),
            };
            run_apply(client, state, &path, dry_run).await?;
        }
        _ => fail(&format!("Unknown command: {cmd}")),
    }
    Ok(())
}

#[derive(Deserialize)]
struct ApplicationFile {
    #[serde(default)]
    personal: PersonalInfo,
    #[serde(default)]
    solar: SolarSpecs,
    #[serde(default)]
    financial: FinancialInfo,
    #[serde(default)]
    documents: DocumentSet,
}

async fn run_apply(
    client: &ApiClient,
    state: &AppState,
    path: &str,
    dry_run: bool,
) -> Result<(), AppError> {
    let file: ApplicationFile = serde_json::from_str(&std::fs::read_to_string(path)?)?;

    let mut draft = LoanApplicationDraft::new();
    draft.apply_personal(file.personal);
    draft.advance()?;
    draft.apply_solar(file.solar);
    draft.advance()?;
    draft.apply_financial(file.financial);
    let preview = draft.preview(&state.subsidy);
    if let Some(emi) = preview.monthly_emi {
        println!("Estimated EMI:      {emi:.0}");
    }
    if let Some(subsidy) = preview.subsidy {
        println!("Estimated subsidy:  {subsidy:.0}");
    }
    draft.advance()?;
    draft.apply_documents(file.documents);
    draft.advance()?;

    let documents = draft.documents.clone();
    let payload = draft.into_payload()?;
    if dry_run {
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    let loan = client.loans().create(&payload).await?;
    println!("Created application {}", loan.id);

    let uploads = [
        (documents.aadhaar, DocumentType::Aadhaar),
        (documents.pan, DocumentType::Pan),
        (documents.bank_statement, DocumentType::BankStatement),
        (documents.salary_slip, DocumentType::IncomeProof),
    ];
    for (file, kind) in uploads {
        if let Some(file) = file {
            let doc = client
                .documents()
                .upload_path(&file, kind, Some(loan.id.as_str()))
                .await?;
            println!("Uploaded {} as {}", doc.file_name, kind.as_str());
        }
    }

    let submitted = client.loans().submit(&loan.id).await?;
    println!("Submitted: {} ({})", submitted.loan_id, submitted.status);
    for step in submitted.workflow_steps {
        println!("  - {step}");
    }
    Ok(())
}
