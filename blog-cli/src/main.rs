use anyhow::{Context, Result};
use blog_client::error::BlogClientError;
use blog_client::models::{Author, Post};
use blog_client::BlogClient;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Server base URL
    #[arg(
        short,
        long,
        env = "BLOG_SERVER",
        default_value = "http://localhost:5000"
    )]
    server: String,

    /// Where the auth token is kept (default: ~/.blog_token)
    #[arg(long)]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and save its token
    Register {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },

    /// Log in and save the token
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },

    /// Show the saved token
    Status,

    /// List all posts, newest first
    List,

    /// Show a single post
    Get {
        #[arg(short, long)]
        id: i64,
    },

    /// Create a post, optionally with an image
    Create {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        body: String,

        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Change the title, body or image of your post
    Update {
        #[arg(short, long)]
        id: i64,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        body: Option<String>,

        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Delete your post
    Delete {
        #[arg(short, long)]
        id: i64,
    },

    /// Like a post, or unlike it if already liked
    Like {
        #[arg(short, long)]
        id: i64,
    },

    /// Show the comments of a post
    Comments {
        #[arg(short, long)]
        post: i64,
    },

    /// Comment on a post
    Comment {
        #[arg(short, long)]
        post: i64,

        #[arg(short, long)]
        text: String,
    },
}

struct TokenManager {
    token_path: PathBuf,
}

impl TokenManager {
    fn new(custom_path: Option<PathBuf>) -> Result<Self> {
        let token_path = match custom_path {
            Some(path) => path,
            None => {
                let home = dirs::home_dir().context("Failed to get home directory")?;
                home.join(".blog_token")
            }
        };

        Ok(Self { token_path })
    }

    fn save_token(&self, token: &str) -> Result<()> {
        fs::write(&self.token_path, token)
            .with_context(|| format!("Failed to save token to {:?}", self.token_path))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.token_path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.token_path, perms)?;
        }

        println!("{} Token saved to {:?}", "✓".green(), self.token_path);
        Ok(())
    }

    fn load_token(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.token_path) {
            Ok(token) => {
                let token = token.trim().to_string();
                Ok((!token.is_empty()).then_some(token))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).context("Failed to read token file"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let token_manager = TokenManager::new(cli.token_file)?;

    // Status never talks to the server
    if let Commands::Status = cli.command {
        match token_manager.load_token()? {
            Some(token) => {
                let preview: String = token.chars().take(20).collect();
                println!("🔑 Token file: {:?}", token_manager.token_path);
                println!("   Token: {}...", preview);
                println!("   Length: {} characters", token.len());
                println!("   Status: {}", "active".green());
            }
            None => {
                println!("{} No token found", "✗".red());
                println!("   Please login first: blog-cli login --email <email> --password <password>");
            }
        }
        return Ok(());
    }

    let client = BlogClient::new(cli.server.clone());
    if let Some(token) = token_manager.load_token()? {
        client.set_token(token).await;
    }

    match cli.command {
        Commands::Status => {}

        Commands::Register {
            name,
            email,
            password,
        } => {
            println!("📝 Registering user: {}", email);

            let response = client
                .register(name, email, password)
                .await
                .unwrap_or_else(|e| fail("Registration failed", e));

            println!("{} Registration successful!", "✓".green());
            println!("   User ID: {}", response.user.id);
            println!("   Name: {}", response.user.name);
            println!("   Email: {}", response.user.email);
            token_manager.save_token(&response.token)?;
        }

        Commands::Login { email, password } => {
            println!("🔑 Logging in as: {}", email);

            let response = client
                .login(email, password)
                .await
                .unwrap_or_else(|e| fail("Login failed", e));

            println!("{} Login successful!", "✓".green());
            println!("   User ID: {}", response.user.id);
            println!("   Name: {}", response.user.name);
            token_manager.save_token(&response.token)?;
        }

        Commands::List => {
            let posts = client
                .list_posts()
                .await
                .unwrap_or_else(|e| fail("Failed to list posts", e));

            println!("{} Found {} posts", "✓".green(), posts.len());
            println!();

            if posts.is_empty() {
                println!("   No posts yet");
            }
            for post in &posts {
                println!("   [{}] {}", post.id, post.title.bold());
                println!(
                    "      by {}, {} likes, {}",
                    author_label(&post.author),
                    post.likes.len(),
                    post.created_at.format("%Y-%m-%d %H:%M")
                );
                println!("      {}", truncate(&post.body, 50));
                println!();
            }
        }

        Commands::Get { id } => {
            let post = client
                .get_post(id)
                .await
                .unwrap_or_else(|e| fail(&format!("Failed to get post #{}", id), e));

            print_post(&post);
        }

        Commands::Create { title, body, image } => {
            println!("📝 Creating new post...");

            let post = client
                .create_post(title, body, image.as_deref())
                .await
                .unwrap_or_else(|e| fail("Failed to create post", e));

            println!("{} Post created successfully!", "✓".green());
            print_post(&post);
        }

        Commands::Update {
            id,
            title,
            body,
            image,
        } => {
            println!("✏️ Updating post #{}", id);

            let post = client
                .update_post(id, title, body, image.as_deref())
                .await
                .unwrap_or_else(|e| fail(&format!("Failed to update post #{}", id), e));

            println!("{} Post updated successfully!", "✓".green());
            print_post(&post);
        }

        Commands::Delete { id } => {
            client
                .delete_post(id)
                .await
                .unwrap_or_else(|e| fail(&format!("Failed to delete post #{}", id), e));

            println!("{} Post #{} deleted", "✓".green(), id);
        }

        Commands::Like { id } => {
            let like = client
                .toggle_like(id)
                .await
                .unwrap_or_else(|e| fail(&format!("Failed to like post #{}", id), e));

            let state = if like.liked { "liked" } else { "unliked" };
            println!(
                "{} Post #{} {} ({} likes)",
                "✓".green(),
                id,
                state,
                like.likes_count
            );
        }

        Commands::Comments { post } => {
            let comments = client
                .list_comments(post)
                .await
                .unwrap_or_else(|e| fail("Failed to list comments", e));

            println!("💬 {} comments on post #{}", comments.len(), post);
            for comment in &comments {
                println!(
                    "   {} ({}): {}",
                    author_label(&comment.author).as_str().bold(),
                    comment.created_at.format("%Y-%m-%d %H:%M"),
                    comment.text
                );
            }
        }

        Commands::Comment { post, text } => {
            let comment = client
                .add_comment(post, text)
                .await
                .unwrap_or_else(|e| fail("Failed to add comment", e));

            println!(
                "{} Comment #{} added to post #{}",
                "✓".green(),
                comment.id,
                comment.post
            );
        }
    }

    Ok(())
}

fn fail(action: &str, e: BlogClientError) -> ! {
    eprintln!("{} {}: {}", "✗".red(), action, e);
    if e.is_unauthorized() {
        eprintln!("   Please login first: blog-cli login --email <email> --password <password>");
    } else if e.is_forbidden() {
        eprintln!("   Only the author of a post can change it");
    } else if e.is_not_found() {
        eprintln!("   Tip: Use 'list' command to see available posts");
    }
    std::process::exit(1);
}

fn print_post(post: &Post) {
    println!("   ID: {}", post.id);
    println!("   Title: {}", post.title);
    println!("   Body: {}", post.body);
    if let Some(image) = &post.image {
        println!("   Image: {}", image);
    }
    println!("   Author: {}", author_label(&post.author));
    println!("   Likes: {}", post.likes.len());
    println!("   Created: {}", post.created_at);
    println!("   Updated: {}", post.updated_at);
}

fn author_label(author: &Author) -> String {
    match &author.name {
        Some(name) => name.clone(),
        None => format!("user #{}", author.id),
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}
