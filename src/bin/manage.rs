// Management commands - create accounts and groups, seed sample content

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use social_blog::{
    config::Config,
    entities::{EntFollow, EntGroup, EntPost, EntUser, FollowOutcome, NewGroup, NewPost},
    forms::SignupForm,
    infrastructure::{database::BlogDatabase, security::hash_password},
};

#[derive(Parser)]
#[command(name = "manage", about = "Social blog management commands")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a user account
    CreateUser {
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Create a post group
    CreateGroup {
        title: String,
        slug: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Fill the database with sample users, groups, posts and follows
    Seed {
        #[arg(long, default_value = "password123")]
        password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("social_blog=info")))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let db = BlogDatabase::new(&config.database.url).await?;
    db.init().await?;

    match cli.command {
        Command::CreateUser { username, password } => {
            check_new_user(&username, &password)?;
            let user = EntUser::create(&db, &username, &hash_password(&password)?).await?;
            println!("✓ Created user '{}' with ID: {}", user.username, user.id);
        }
        Command::CreateGroup {
            title,
            slug,
            description,
        } => {
            let group = EntGroup::create(&db, NewGroup { title, slug, description }).await?;
            println!("✓ Created group '{}' at /group/{}/", group.title, group.slug);
        }
        Command::Seed { password } => seed(&db, &password).await?,
    }

    Ok(())
}

/// Same username and password rules as the signup page.
fn check_new_user(username: &str, password: &str) -> anyhow::Result<()> {
    let form = SignupForm {
        username: username.to_string(),
        password1: password.to_string(),
        password2: password.to_string(),
    };
    form.clean()
        .map_err(|errors| anyhow::anyhow!("Cannot create user {:?}: {}", username, errors))
}

async fn seed(db: &BlogDatabase, password: &str) -> anyhow::Result<()> {
    let sample_users = ["leo", "anna", "boris", "nagibator2007"];
    let sample_groups = [
        ("Cats", "cats", "Everything about cats"),
        ("Travel", "travel", "Notes from the road"),
        ("Books", "books", "What we are reading"),
    ];

    let password_hash = hash_password(password)?;
    let mut users = Vec::new();
    println!("👥 Creating {} users...", sample_users.len());
    for username in sample_users {
        let user = match EntUser::gen_by_username(db, username).await? {
            Some(user) => user,
            None => EntUser::create(db, username, &password_hash).await?,
        };
        println!("  ✓ {} (ID {})", user.username, user.id);
        users.push(user);
    }

    let mut groups = Vec::new();
    println!("📚 Creating {} groups...", sample_groups.len());
    for (title, slug, description) in sample_groups {
        let group = match EntGroup::gen_by_slug(db, slug).await? {
            Some(group) => group,
            None => {
                EntGroup::create(
                    db,
                    NewGroup {
                        title: title.to_string(),
                        slug: slug.to_string(),
                        description: description.to_string(),
                    },
                )
                .await?
            }
        };
        println!("  ✓ {} (/group/{}/)", group.title, group.slug);
        groups.push(group);
    }

    println!("📝 Creating posts...");
    let mut created = 0;
    for (i, user) in users.iter().enumerate() {
        for n in 0..6 {
            let group_id = if n % 2 == 0 {
                Some(groups[(i + n) % groups.len()].id)
            } else {
                None
            };
            EntPost::create(
                db,
                NewPost {
                    author_id: user.id,
                    text: format!("Post number {} by {}", n + 1, user.username),
                    group_id,
                    image: None,
                },
            )
            .await?;
            created += 1;
        }
    }
    println!("  ✓ {} posts", created);

    println!("🤝 Creating follows...");
    for (i, user) in users.iter().enumerate() {
        let author = &users[(i + 1) % users.len()];
        if let FollowOutcome::Created = EntFollow::create(db, user.id, author.id).await? {
            println!("  ✓ {} → {}", user.username, author.username);
        }
    }

    println!("🎉 Sample data ready");
    Ok(())
}
