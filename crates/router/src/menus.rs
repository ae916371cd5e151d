//! User-visible menu and prompt text (Spanish).
//!
//! Kept in one module so every flow re-shows byte-identical menus.

use portero_storage::{AuditContext, Contact};

/// Main numeric menu; admin options 6 to 10 appended by role.
pub fn main_menu(is_admin: bool) -> String {
    let mut lines = vec![
        "📋 *Menú Principal*".to_string(),
        String::new(),
        "1️⃣  Abrir portón visitas 🚗".to_string(),
        "2️⃣  Abrir portón peatonal 🚶".to_string(),
        "3️⃣  Mostrar portón visitas 🖼️".to_string(),
        "4️⃣  Mostrar portón peatonal 🖼️".to_string(),
        "5️⃣  Estatus del sistema 📊".to_string(),
    ];
    if is_admin {
        lines.push("6️⃣  Gestión de usuarios 👤".to_string());
        lines.push("7️⃣  Auditoría 📜".to_string());
        lines.push("8️⃣  Blacklist 🚫".to_string());
        lines.push("9️⃣  Snapshot cámara frontal 🖼️".to_string());
        lines.push("🔟  Video 30s cámara frontal 🎥".to_string());
    }
    lines.push(String::new());
    lines.push("Responde con el número de la opción.".to_string());
    lines.join("\n")
}

/// User-management submenu.
pub fn user_menu() -> &'static str {
    "*Gestión Usuarios*\n1️⃣ Crear\n2️⃣ Listar\n3️⃣ Actualizar\n4️⃣ Borrar\n5️⃣ Buscar\n6️⃣ Volver"
}

/// Blacklist submenu.
pub fn blacklist_menu() -> &'static str {
    "*Menú Blacklist*\n1️⃣ Listar\n2️⃣ Remover número\n3️⃣ Volver"
}

/// Audit submenu, annotated with the active filter when one is set.
pub fn audit_menu(ctx: Option<&AuditContext>) -> String {
    let filter_info = match ctx.and_then(|c| c.filter_number.as_deref()) {
        Some(n) => format!(" (Filtro: {n})"),
        None => String::new(),
    };
    format!(
        "📜 *Menú Auditoría*{filter_info}\n\
         \n\
         1️⃣  Últimos 10 mensajes\n\
         2️⃣  Últimos 100 mensajes\n\
         3️⃣  Últimos 200 mensajes\n\
         4️⃣  Exportar CSV mensajes\n\
         5️⃣  Volver al menú principal\n\
         6️⃣  Establecer filtro por número\n\
         7️⃣  Limpiar filtro\n\
         8️⃣  Siguiente página (100)\n\
         9️⃣  Reset paginación\n\
         \n\
         Envía el número de la opción."
    )
}

/// Help text for the `!usuario` / `!blacklist` slash commands.
pub fn user_admin_help() -> &'static str {
    "👤 *Gestión de Usuarios*\n\
     \n\
     Comandos:\n\
     !usuario alta <numero> <nombre> <admin|normal>\n\
     !usuario listar\n\
     !usuario actualizar <numero> [nombre=Nuevo Nombre] [rol=admin|normal] [activo=true|false]\n\
     !usuario borrar <numero>\n\
     \n\
     Blacklist:\n\
     !blacklist listar\n\
     !blacklist remover <numero>"
}

/// One listing line per contact, shared by list and search output.
pub fn contact_line(c: &Contact) -> String {
    format!(
        "{} | {} | {} | {}",
        c.number,
        c.name,
        c.role.as_str(),
        if c.active { "activo" } else { "inactivo" }
    )
}
