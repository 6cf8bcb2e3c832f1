//! User-facing notice shown when credentials land in the encrypted file.

use std::path::Path;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";
const MORE_INFO_URL: &str = "https://github.com/eutika/eu-missions-cli#security";

/// Render the security notice for a fallback store at `path`.
pub fn render(path: &Path) -> String {
    let mut lines = vec![
        String::new(),
        "⚠️  Aviso de Seguridad".to_string(),
        RULE.to_string(),
        "El keyring del sistema no está disponible en este entorno.".to_string(),
        format!("Los tokens se guardarán cifrados en: {}", path.display()),
        String::new(),
        "💡 Para mayor seguridad, considera configurar un keyring del sistema:".to_string(),
    ];
    lines.extend(platform_hints().iter().map(|hint| format!("   • {hint}")));
    lines.push(String::new());
    lines.push(format!("ℹ️  Más información: {MORE_INFO_URL}"));
    lines.push(RULE.to_string());
    lines.join("\n")
}

fn platform_hints() -> &'static [&'static str] {
    if cfg!(target_os = "linux") {
        &[
            "Instala gnome-keyring: sudo apt-get install gnome-keyring",
            "O usa KWallet si estás en KDE",
            "Luego ejecuta: eval $(dbus-launch --sh-syntax)",
        ]
    } else if cfg!(target_os = "macos") {
        &[
            "Verifica que Keychain esté funcionando correctamente",
            "Si estás en SSH, puede que Keychain no esté accesible",
        ]
    } else if cfg!(target_os = "windows") {
        &["Verifica que Credential Manager esté funcionando correctamente"]
    } else {
        &[]
    }
}
