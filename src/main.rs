//! parse-admin: command-line administration for Parse Server applications.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use parse_admin::profile::{ProfileStore, SavedQuery, ServerProfile};
use parse_admin::wire;
use parse_admin::{
    ClientConfig, ParseClient, ParseError, ParseFile, ParseObject, ParseQuery, ParseSchema,
    PushNotification,
};

#[derive(Parser, Debug)]
#[command(name = "parse-admin")]
#[command(about = "Administer Parse Server applications with the master key")]
struct Cli {
    /// Stored profile to connect with; without it PARSE_SERVER_URL, PARSE_APP_ID
    /// and PARSE_MASTER_KEY are used
    #[arg(short, long, global = true)]
    profile: Option<String>,

    /// Location of the profile store
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage stored server profiles
    #[command(subcommand)]
    Profile(ProfileCommand),
    /// Show the server version and enabled features
    ServerInfo,
    /// Browse and manage class schemas
    #[command(subcommand)]
    Schemas(SchemaCommand),
    /// Browse and edit objects
    #[command(subcommand)]
    Objects(ObjectCommand),
    /// Run and manage saved queries
    #[command(subcommand)]
    Query(QueryCommand),
    /// Send a push notification
    Push(PushArgs),
    /// Upload a file and print its name and URL
    Upload { path: PathBuf },
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        app_id: String,
        #[arg(long)]
        master_key: String,
        #[arg(long)]
        url: String,
        #[arg(long)]
        icon: Option<String>,
        /// Replace an existing profile with the same name
        #[arg(long)]
        replace: bool,
    },
    List,
    Remove {
        name: String,
    },
}

#[derive(Subcommand, Debug)]
enum SchemaCommand {
    List,
    Show {
        class_name: String,
    },
    Delete {
        class_name: String,
        /// Offer to delete all objects when the class is not empty
        #[arg(long)]
        purge: bool,
        /// Answer yes to the purge confirmation
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// JSON `where` body, e.g. '{"score":{"$gt":10}}'
    #[arg(long = "where")]
    where_clause: Option<String>,
    #[arg(long)]
    limit: Option<isize>,
    #[arg(long)]
    skip: Option<usize>,
    /// Sort keys, `-` prefix for descending
    #[arg(long)]
    order: Option<String>,
    /// Comma-separated columns to fetch
    #[arg(long)]
    keys: Option<String>,
    /// Comma-separated pointer fields to include
    #[arg(long)]
    include: Option<String>,
}

impl FilterArgs {
    fn to_query(&self, class_name: &str) -> Result<ParseQuery, ParseError> {
        let mut query = ParseQuery::new(class_name);
        if let Some(raw) = &self.where_clause {
            query.where_fragment(raw)?;
        }
        if let Some(limit) = self.limit {
            query.limit(limit);
        }
        if let Some(skip) = self.skip {
            query.skip(skip);
        }
        if let Some(order) = &self.order {
            query.order(order);
        }
        if let Some(keys) = &self.keys {
            query.select(&split_csv(keys));
        }
        if let Some(include) = &self.include {
            query.include(&split_csv(include));
        }
        Ok(query)
    }
}

#[derive(Subcommand, Debug)]
enum ObjectCommand {
    List {
        class_name: String,
        #[command(flatten)]
        filter: FilterArgs,
    },
    Count {
        class_name: String,
    },
    Get {
        class_name: String,
        object_id: String,
    },
    /// Set one field, interpreting VALUE by the field's schema type
    Update {
        class_name: String,
        object_id: String,
        field: String,
        value: String,
    },
    Unset {
        class_name: String,
        object_id: String,
        field: String,
    },
    Delete {
        class_name: String,
        object_id: String,
    },
}

#[derive(Subcommand, Debug)]
enum QueryCommand {
    /// Build a query string from filters and print it
    Build {
        class_name: String,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Run a raw query string, or a saved query with --saved
    Run {
        class_name: String,
        query_string: Option<String>,
        #[arg(long)]
        saved: Option<String>,
    },
    /// Save a query string under the current profile
    Save {
        class_name: String,
        label: String,
        query_string: String,
        /// Comma-separated columns to show
        #[arg(long)]
        keys: Option<String>,
    },
    List {
        class_name: Option<String>,
    },
    Remove {
        class_name: String,
        label: String,
    },
}

#[derive(Args, Debug)]
struct PushArgs {
    #[arg(long)]
    alert: Option<String>,
    #[arg(long)]
    title: Option<String>,
    #[arg(long = "channel")]
    channels: Vec<String>,
    /// JSON `where` body over _Installation
    #[arg(long = "where")]
    where_clause: Option<String>,
    #[arg(long)]
    badge: Option<String>,
    #[arg(long)]
    sound: Option<String>,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        match err.downcast_ref::<ParseError>() {
            Some(parse_err) => eprintln!("Error: {}", parse_err.user_message()),
            None => eprintln!("Error: {:#}", err),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut store = match &cli.store {
        Some(path) => ProfileStore::open(path)?,
        None => ProfileStore::open_default()?,
    };

    match cli.command {
        Command::Profile(command) => run_profile(command, &mut store),
        Command::ServerInfo => {
            let client = connect(&store, cli.profile.as_deref())?;
            let info = client.server_info().await?;
            println!("Parse Server {}", info.parse_server_version);
            let mut groups: Vec<_> = info.features.iter().collect();
            groups.sort_by(|a, b| a.0.cmp(b.0));
            for (group, flags) in groups {
                let enabled: Vec<&str> = flags
                    .iter()
                    .filter(|(_, v)| v.as_bool() == Some(true))
                    .map(|(k, _)| k.as_str())
                    .collect();
                println!("  {}: {}", group, enabled.join(", "));
            }
            Ok(())
        }
        Command::Schemas(command) => {
            let client = connect(&store, cli.profile.as_deref())?;
            run_schemas(command, &client).await
        }
        Command::Objects(command) => {
            let client = connect(&store, cli.profile.as_deref())?;
            run_objects(command, &client).await
        }
        Command::Query(command) => run_query(command, &mut store, cli.profile.as_deref()).await,
        Command::Push(args) => {
            let client = connect(&store, cli.profile.as_deref())?;
            let mut push = match args.alert {
                Some(alert) => PushNotification::alert(alert),
                None => PushNotification::default(),
            };
            if !args.channels.is_empty() {
                let channels: Vec<&str> = args.channels.iter().map(String::as_str).collect();
                push = push.to_channels(&channels);
            }
            if let Some(raw) = &args.where_clause {
                let mut query = ParseQuery::new("_Installation");
                query.where_fragment(raw)?;
                push = push.to_installations(&query);
            }
            if let Some(title) = args.title {
                push = push.title(title);
            }
            if let Some(badge) = args.badge {
                let badge = badge
                    .parse::<i64>()
                    .map(serde_json::Value::from)
                    .unwrap_or(serde_json::Value::String(badge));
                push = push.badge(badge);
            }
            if let Some(sound) = args.sound {
                push = push.sound(sound);
            }
            client.send_push(&push).await?;
            println!("Push accepted");
            Ok(())
        }
        Command::Upload { path } => {
            let client = connect(&store, cli.profile.as_deref())?;
            let mut file = ParseFile::from_path(&path)?;
            let field = client.save_file(&mut file).await?;
            println!("{}\t{}", field.name, field.url);
            Ok(())
        }
    }
}

fn connect(store: &ProfileStore, profile: Option<&str>) -> Result<ParseClient> {
    let client = match profile {
        Some(name) => {
            let profile = store
                .profile(name)
                .ok_or_else(|| anyhow!("No profile named '{}'", name))?;
            ParseClient::from_profile(profile)?
        }
        None => ParseClient::from_config(&ClientConfig::from_env()?)?,
    };
    Ok(client)
}

fn run_profile(command: ProfileCommand, store: &mut ProfileStore) -> Result<()> {
    match command {
        ProfileCommand::Add {
            name,
            app_id,
            master_key,
            url,
            icon,
            replace,
        } => {
            let mut profile = ServerProfile::new(name, app_id, master_key, url);
            profile.icon = icon;
            if replace {
                store.upsert_profile(profile)?;
            } else {
                store.add_profile(profile)?;
            }
            store.save()?;
        }
        ProfileCommand::List => {
            for profile in store.profiles() {
                println!(
                    "{}\t{}\t{}",
                    profile.name, profile.server_url, profile.application_id
                );
            }
        }
        ProfileCommand::Remove { name } => {
            if store.remove_profile(&name).is_none() {
                bail!("No profile named '{}'", name);
            }
            store.save()?;
        }
    }
    Ok(())
}

async fn run_schemas(command: SchemaCommand, client: &ParseClient) -> Result<()> {
    match command {
        SchemaCommand::List => {
            let mut schemas = client.get_all_schemas().await?.results;
            schemas.sort_by(|a, b| a.class_name.cmp(&b.class_name));
            for schema in schemas {
                println!("{}\t{} fields", schema.class_name, schema.fields.len());
            }
        }
        SchemaCommand::Show { class_name } => {
            let schema = client.get_class_schema(&class_name).await?;
            for name in schema.field_names() {
                let field = &schema.fields[name];
                match &field.target_class {
                    Some(target) => println!("{}\t{}<{}>", name, field.field_type, target),
                    None => println!("{}\t{}", name, field.field_type),
                }
            }
        }
        SchemaCommand::Delete {
            class_name,
            purge,
            yes,
        } => {
            if !purge {
                client.delete_class_schema(&class_name).await?;
                println!("Deleted class {}", class_name);
                return Ok(());
            }
            let purged = client
                .delete_class_schema_with_purge(&class_name, |err| {
                    yes || confirm(&format!(
                        "{}\nDelete every object in {} and retry?",
                        err, class_name
                    ))
                })
                .await?;
            println!("Deleted class {} ({} objects removed)", class_name, purged);
        }
    }
    Ok(())
}

async fn run_objects(command: ObjectCommand, client: &ParseClient) -> Result<()> {
    match command {
        ObjectCommand::List { class_name, filter } => {
            let schema = client.get_class_schema(&class_name).await?;
            let query = filter.to_query(&class_name)?;
            let objects = client.find_objects(&query).await?;
            let columns = filter
                .keys
                .as_deref()
                .map(split_csv)
                .unwrap_or_else(|| schema.field_names());
            print_table(&schema, &objects, &columns);
        }
        ObjectCommand::Count { class_name } => {
            println!("{}", client.count_objects(&class_name).await?);
        }
        ObjectCommand::Get {
            class_name,
            object_id,
        } => {
            let schema = client.get_class_schema(&class_name).await?;
            let object = client.retrieve_object(&class_name, &object_id).await?;
            for name in schema.field_names() {
                println!("{}\t{}", name, object.display(&schema, name));
            }
        }
        ObjectCommand::Update {
            class_name,
            object_id,
            field,
            value,
        } => {
            let schema = client.get_class_schema(&class_name).await?;
            let field_schema = schema
                .field(&field)
                .with_context(|| format!("{} has no field '{}'", class_name, field))?;
            let body = wire::encode_field(&field, &value, field_schema)?;
            let response = client.update_object(&class_name, &object_id, &body).await?;
            println!("Updated at {}", response.updated_at.iso());
        }
        ObjectCommand::Unset {
            class_name,
            object_id,
            field,
        } => {
            let body = wire::encode_delete(&field)?;
            let response = client.update_object(&class_name, &object_id, &body).await?;
            println!("Updated at {}", response.updated_at.iso());
        }
        ObjectCommand::Delete {
            class_name,
            object_id,
        } => {
            client.delete_object(&class_name, &object_id).await?;
            println!("Deleted {} {}", class_name, object_id);
        }
    }
    Ok(())
}

async fn run_query(
    command: QueryCommand,
    store: &mut ProfileStore,
    profile: Option<&str>,
) -> Result<()> {
    match command {
        QueryCommand::Build { class_name, filter } => {
            println!("{}", filter.to_query(&class_name)?.to_query_string());
        }
        QueryCommand::Run {
            class_name,
            query_string,
            saved,
        } => {
            let client = connect(store, profile)?;
            let (query_string, keys) = match (saved, query_string) {
                (Some(label), _) => {
                    let profile = profile.context("--saved needs --profile")?;
                    let saved = store
                        .saved_queries(profile, Some(class_name.as_str()))
                        .into_iter()
                        .find(|q| q.label == label)
                        .with_context(|| format!("No saved query '{}' for {}", label, class_name))?;
                    (saved.query.clone(), saved.keys.clone())
                }
                (None, Some(raw)) => (raw, Vec::new()),
                (None, None) => (ParseQuery::new(&class_name).to_query_string(), Vec::new()),
            };
            let schema = client.get_class_schema(&class_name).await?;
            let objects = client
                .find_with_query_string(&class_name, &query_string)
                .await?;
            let columns: Vec<&str> = if keys.is_empty() {
                schema.field_names()
            } else {
                keys.iter().map(String::as_str).collect()
            };
            print_table(&schema, &objects, &columns);
        }
        QueryCommand::Save {
            class_name,
            label,
            query_string,
            keys,
        } => {
            let profile = profile.context("Saving a query needs --profile")?;
            store.save_query(SavedQuery {
                profile: profile.to_string(),
                class_name,
                label,
                query: query_string,
                keys: keys
                    .as_deref()
                    .map(|k| split_csv(k).into_iter().map(str::to_string).collect())
                    .unwrap_or_default(),
            })?;
            store.save()?;
        }
        QueryCommand::List { class_name } => {
            let profile = profile.context("Listing saved queries needs --profile")?;
            for saved in store.saved_queries(profile, class_name.as_deref()) {
                println!("{}\t{}\t{}", saved.class_name, saved.label, saved.query);
            }
        }
        QueryCommand::Remove { class_name, label } => {
            let profile = profile.context("Removing a saved query needs --profile")?;
            if !store.remove_query(profile, &class_name, &label) {
                bail!("No saved query '{}' for {}", label, class_name);
            }
            store.save()?;
        }
    }
    Ok(())
}

fn print_table(schema: &ParseSchema, objects: &[ParseObject], columns: &[&str]) {
    println!("{}", columns.join("\t"));
    for object in objects {
        let row: Vec<String> = columns
            .iter()
            .map(|column| object.display(schema, column).to_string())
            .collect();
        println!("{}", row.join("\t"));
    }
}

fn split_csv(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

fn confirm(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}
